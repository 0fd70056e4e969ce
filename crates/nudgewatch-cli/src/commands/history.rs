use clap::Args;
use nudgewatch_core::Database;

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of check-ins to show, newest first
    #[arg(long, default_value = "10")]
    limit: usize,
    /// Print JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let checkins = db.recent_checkins(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&checkins)?);
        return Ok(());
    }
    if checkins.is_empty() {
        println!("no check-ins yet");
        return Ok(());
    }
    for c in &checkins {
        let status = match &c.error {
            Some(err) => format!(" (error: {err})"),
            None => String::new(),
        };
        println!(
            "{}  {:<4} u{:<2} {}{status}",
            c.checked_at.format("%Y-%m-%d %H:%M"),
            c.decision,
            c.urgency,
            c.summary
        );
        if !c.sources_failed.is_empty() {
            println!("    failed sources: {}", c.sources_failed.join(", "));
        }
    }
    Ok(())
}

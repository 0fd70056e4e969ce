use clap::Subcommand;
use nudgewatch_core::Database;

#[derive(Subcommand)]
pub enum TrackingAction {
    /// List tracked email conversations
    List {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TrackingAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TrackingAction::List { json } => {
            let rows = db.list_email_tracking()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            for t in &rows {
                let notified = t
                    .last_notified
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "never".into());
                let replied = if t.reply_detected { "replied" } else { "open" };
                println!("{}  first seen {}  notified {notified}  {replied}", t.conversation_id, t.first_seen.to_rfc3339());
            }
        }
    }
    Ok(())
}

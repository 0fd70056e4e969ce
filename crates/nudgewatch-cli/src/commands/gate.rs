use chrono::{DateTime, Utc};
use clap::Subcommand;
use nudgewatch_core::orchestrator::REASON_PAUSED;
use nudgewatch_core::{Config, Database, GatingEngine, GatingResult};

#[derive(Subcommand)]
pub enum GateAction {
    /// Report whether a cycle would proceed right now
    Check {
        /// Evaluate at this instant instead of now (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: GateAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GateAction::Check { at } => {
            let now = match at {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| format!("invalid --at '{raw}': {e}"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let config = Config::load()?;
            let db = Database::open()?;

            if db.is_paused()? {
                println!("blocked: {REASON_PAUSED}");
                return Ok(());
            }
            match GatingEngine::new(config.gating).evaluate(now, &db) {
                GatingResult::Proceed => println!("proceed"),
                GatingResult::Blocked { reason } => println!("blocked: {reason}"),
            }
        }
    }
    Ok(())
}

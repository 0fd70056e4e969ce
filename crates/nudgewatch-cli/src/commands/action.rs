use chrono::Utc;
use nudgewatch_core::{ActionHandler, Config, Database, SnoozePolicy, UserAction};
use tracing::debug;

/// Apply a callback identifier against the stored state.
pub fn run(identifier: &str) -> Result<(), Box<dyn std::error::Error>> {
    let action = UserAction::parse(identifier)?;
    debug!(?action, identifier, "parsed action");
    if action == UserAction::RunNow {
        return Err("run_now needs a running daemon; the CLI does not run cycles".into());
    }

    let config = Config::load()?;
    let db = Database::open()?;
    let outcome = ActionHandler::new(&db, SnoozePolicy::from(&config.snooze)).apply(&action, Utc::now())?;
    println!("{outcome}");
    Ok(())
}

pub fn set_paused(paused: bool) -> Result<(), Box<dyn std::error::Error>> {
    let action = if paused {
        UserAction::Pause
    } else {
        UserAction::Resume
    };
    let db = Database::open()?;
    let outcome = ActionHandler::new(&db, SnoozePolicy::default()).apply(&action, Utc::now())?;
    println!("{outcome}");
    Ok(())
}

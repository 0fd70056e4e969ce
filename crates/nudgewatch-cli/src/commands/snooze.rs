use chrono::{Duration, Utc};
use clap::Subcommand;
use nudgewatch_core::{Config, Database, SnoozePolicy, SnoozeState, SnoozeStore, SourceKind};

#[derive(Subcommand)]
pub enum SnoozeAction {
    /// Snooze an item
    Add {
        /// Source kind: email, task or calendar
        kind: SourceKind,
        /// Conversation, task or event id
        id: String,
        /// Minutes to snooze (default: snooze.item_minutes)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// List snoozed items
    List {
        /// Include expired rows not yet purged
        #[arg(long)]
        all: bool,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a snooze
    Remove {
        kind: SourceKind,
        id: String,
    },
    /// Delete expired snoozes
    Purge,
}

pub fn run(action: SnoozeAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        SnoozeAction::Add { kind, id, minutes } => {
            let config = Config::load()?;
            let store = SnoozeStore::new(&db, SnoozePolicy::from(&config.snooze));
            let until = match minutes {
                Some(0) => return Err("--minutes must be greater than 0".into()),
                Some(m) => store.snooze_for(kind, &id, now, Duration::minutes(i64::from(m)))?,
                None => store.snooze_item(kind, &id, now)?,
            };
            println!("snoozed {kind} {id} until {}", until.to_rfc3339());
        }
        SnoozeAction::List { all, json } => {
            let items: Vec<_> = db
                .list_snoozes()?
                .into_iter()
                .filter(|s| all || SnoozeState::at(Some(s.snooze_until), now).is_snoozed())
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("nothing snoozed");
            } else {
                for s in &items {
                    println!("{:<8} {}  until {}", s.source_type, s.source_id, s.snooze_until.to_rfc3339());
                }
            }
        }
        SnoozeAction::Remove { kind, id } => {
            if db.unsnooze(kind, &id)? {
                println!("unsnoozed {kind} {id}");
            } else {
                println!("{kind} {id} was not snoozed");
            }
        }
        SnoozeAction::Purge => {
            let removed = db.purge_expired_snoozes(now)?;
            println!("purged {removed} expired snoozes");
        }
    }
    Ok(())
}

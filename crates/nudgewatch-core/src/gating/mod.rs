//! Time-of-day and cooldown gating.

mod engine;
mod policy;
mod window;

pub use engine::{GatingEngine, GatingResult, LastCycleSource};
pub use policy::{GatingConfig, PickupConfig, PickupTime, WeekendMode};
pub use window::{TimeOfDay, TimeWindow};

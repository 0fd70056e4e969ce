pub mod action;
pub mod config;
pub mod gate;
pub mod history;
pub mod snooze;
pub mod tracking;

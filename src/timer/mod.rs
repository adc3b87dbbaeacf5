pub mod controller;
pub mod state;

pub use controller::{RunController, RunSnapshot, TimerReading};
pub use state::{IntervalTimer, TimerStatus};

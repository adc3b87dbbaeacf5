pub mod feed;
pub mod fix;
pub mod signal;
pub mod units;

pub use feed::{AuthorizationStatus, LocationFeed, Subscription};
pub use fix::{LocationFix, SpeedSample, NOISE_FLOOR_MPS};
pub use signal::SignalQuality;
pub use units::SpeedUnit;

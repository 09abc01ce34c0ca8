pub mod controller;
pub mod state;
pub mod threshold;

pub use controller::{TrackerController, TrackerSnapshot};
pub use state::{ClassAccumulator, IngestOutcome, TrackerState, TrackerStatus};
pub use threshold::{Threshold, DEFAULT_THRESHOLD_PERCENT};

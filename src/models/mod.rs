pub mod sample;
pub mod session;

pub use sample::{top_sample, Sample};
pub use session::{ClassDuration, HistoryEntry, SessionSummary};

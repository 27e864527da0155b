mod profile;
mod types;
mod version;

pub use profile::{ParseProfileError, ProfileName};
pub use types::{DecisionRecord, DecisionReason, MetricSnapshot, PersistedState, StatusSnapshot};
pub use version::{MIN_SUPPORTED_VERSION, STATUS_FORMAT_VERSION};

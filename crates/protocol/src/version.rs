//! Versioning for the status document the daemon writes each tick.
//!
//! # Version History
//!
//! | Version | Changes |
//! |---------|---------|
//! | 1 | Initial status document |
//!
//! Readers accept any document in `MIN_SUPPORTED_VERSION..=STATUS_FORMAT_VERSION`.
//! New optional fields must carry `#[serde(default)]` so older documents still parse.

/// Current status document version. Bump when making breaking changes.
pub const STATUS_FORMAT_VERSION: u32 = 1;

/// Oldest status document version this build can read.
pub const MIN_SUPPORTED_VERSION: u32 = 1;

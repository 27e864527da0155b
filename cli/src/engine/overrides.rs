use std::io;
use std::path::PathBuf;

use powershift_protocol::ProfileName;
use tracing::{debug, info, warn};

use super::state::{read_value, remove_file, write_atomic};

const AUTO: &str = "auto";

/// The manual override request file.
///
/// A profile literal pins that profile. Empty content, `auto`, or anything
/// unrecognized resumes automatic control and the file is removed.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    path: PathBuf,
}

impl OverrideStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the pinned profile, scrubbing any non-pinning content.
    pub fn resolve(&self) -> Option<ProfileName> {
        let raw = match read_value(&self.path) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read override");
                return None;
            }
        };

        if let Some(profile) = ProfileName::parse_trimmed(&raw) {
            return Some(profile);
        }

        if raw.is_empty() || raw == AUTO {
            debug!("Override cleared, automatic control");
        } else {
            info!(value = %raw, "Ignoring unrecognized override");
        }
        if let Err(e) = remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to clear override");
        }
        None
    }

    /// Reads the pin without touching the file.
    pub fn peek(&self) -> Option<ProfileName> {
        read_value(&self.path)
            .ok()
            .flatten()
            .and_then(|raw| ProfileName::parse_trimmed(&raw))
    }

    pub fn pin(&self, profile: ProfileName) -> io::Result<()> {
        write_atomic(&self.path, profile.as_str())
    }

    pub fn clear(&self) -> io::Result<()> {
        remove_file(&self.path)
    }
}

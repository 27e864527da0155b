use std::path::Path;

use color_eyre::eyre::{eyre, Result};
use powershift_protocol::StatusSnapshot;

use crate::engine::write_atomic;

pub fn write_status(path: &Path, status: &StatusSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(status)?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Reads the status document. `Ok(None)` when the daemon never wrote one.
pub fn read_status(path: &Path) -> Result<Option<StatusSnapshot>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let status: StatusSnapshot = serde_json::from_str(&content)?;
    if !status.is_supported() {
        return Err(eyre!(
            "status file format v{} is not supported by this version",
            status.format_version
        ));
    }
    Ok(Some(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::temp_dir;
    use powershift_protocol::{MetricSnapshot, ProfileName};

    #[test]
    fn test_status_file_round_trip() {
        let path = temp_dir("status-file").join("status.json");
        assert!(read_status(&path).unwrap().is_none());

        let mut status = StatusSnapshot::new(1_700_000_000, MetricSnapshot::default());
        status.provider_profile = Some(ProfileName::Balanced);
        write_status(&path, &status).unwrap();

        assert_eq!(read_status(&path).unwrap(), Some(status));
    }

    #[test]
    fn test_future_format_is_rejected() {
        let path = temp_dir("status-future").join("status.json");
        let mut status = StatusSnapshot::new(1, MetricSnapshot::default());
        status.format_version = 999;
        write_status(&path, &status).unwrap();

        assert!(read_status(&path).is_err());
    }
}

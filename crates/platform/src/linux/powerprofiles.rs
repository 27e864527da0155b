use std::time::Duration;

use powershift_protocol::ProfileName;
use tracing::{debug, trace};

use crate::command::{run_with_timeout, DEFAULT_COMMAND_TIMEOUT};
use crate::provider::{classify_failure, ProfileProvider, ProviderError};

const POWERPROFILESCTL: &str = "powerprofilesctl";

/// power-profiles-daemon driven through `powerprofilesctl`.
#[derive(Debug, Clone)]
pub struct PowerProfilesCtl {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl Default for PowerProfilesCtl {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl PowerProfilesCtl {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program(POWERPROFILESCTL, timeout)
    }

    /// Use a different executable speaking the same `get`/`set` interface.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            timeout,
        }
    }

    /// Arguments placed before `get`/`set` on every invocation.
    pub fn with_base_args(mut self, args: &[&str]) -> Self {
        self.base_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[&str]) -> Result<String, ProviderError> {
        let full_args: Vec<&str> = self
            .base_args
            .iter()
            .map(String::as_str)
            .chain(args.iter().copied())
            .collect();
        let output = run_with_timeout(&self.program, &full_args, self.timeout)
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        trace!(
            args = ?args,
            code = ?output.status.code(),
            stdout = %output.stdout.trim(),
            "powerprofilesctl finished"
        );

        if output.success() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(&output.combined()))
        }
    }
}

impl ProfileProvider for PowerProfilesCtl {
    fn get(&self) -> Result<ProfileName, ProviderError> {
        let stdout = self.run(&["get"])?;
        ProfileName::parse_trimmed(&stdout).ok_or_else(|| {
            ProviderError::Failed(format!("unexpected profile {:?}", stdout.trim()))
        })
    }

    fn set(&self, profile: ProfileName) -> Result<(), ProviderError> {
        debug!(profile = %profile, "Setting power profile");
        self.run(&["set", profile.as_str()]).map(|_| ())
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A `sh -c` script standing in for powerprofilesctl; `$1` is the verb.
    fn fake_ctl(script: &str) -> PowerProfilesCtl {
        PowerProfilesCtl::with_program("sh", DEFAULT_COMMAND_TIMEOUT)
            .with_base_args(&["-c", script, "powerprofilesctl"])
    }

    #[test]
    fn test_get_parses_profile() {
        let ctl = fake_ctl("echo performance");
        assert_eq!(ctl.get(), Ok(ProfileName::Performance));
        assert!(ctl.is_available());
    }

    #[test]
    fn test_get_rejects_unknown_output() {
        let ctl = fake_ctl("echo turbo");
        assert!(matches!(ctl.get(), Err(ProviderError::Failed(_))));
    }

    #[test]
    fn test_set_busy_is_classified() {
        let ctl = fake_ctl(
            "echo 'Failed to set profile: Device or resource busy' >&2; exit 1",
        );
        assert!(ctl.set(ProfileName::Performance).unwrap_err().is_busy());
    }

    #[test]
    fn test_set_hard_failure() {
        let ctl = fake_ctl("echo 'Access denied' >&2; exit 1");
        assert!(matches!(
            ctl.set(ProfileName::PowerSaver),
            Err(ProviderError::Failed(_))
        ));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let ctl = PowerProfilesCtl::with_program("powershift-missing-ctl", DEFAULT_COMMAND_TIMEOUT);
        assert!(!ctl.is_available());
        assert!(matches!(ctl.get(), Err(ProviderError::Unavailable(_))));
    }
}

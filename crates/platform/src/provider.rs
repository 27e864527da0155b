//! Power profile provider trait and error types.

use powershift_protocol::ProfileName;

/// Failure modes of a provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider is temporarily busy (e.g. a driver is still activating).
    /// Worth retrying after a short delay.
    #[error("provider busy: {0}")]
    Busy(String),

    #[error("provider call failed: {0}")]
    Failed(String),

    /// The provider tool or service is not installed / reachable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    pub fn is_busy(&self) -> bool {
        matches!(self, ProviderError::Busy(_))
    }
}

/// An external service that owns the active power profile.
///
/// The provider is the source of truth: callers re-read it after every
/// mutation instead of trusting the result of `set`.
pub trait ProfileProvider {
    /// Read the active profile.
    fn get(&self) -> Result<ProfileName, ProviderError>;

    /// Request a profile change. Setting the active profile again is a no-op.
    fn set(&self, profile: ProfileName) -> Result<(), ProviderError>;

    /// Check whether the provider can be reached at all.
    fn is_available(&self) -> bool {
        true
    }
}

impl<P: ProfileProvider + ?Sized> ProfileProvider for &P {
    fn get(&self) -> Result<ProfileName, ProviderError> {
        (**self).get()
    }

    fn set(&self, profile: ProfileName) -> Result<(), ProviderError> {
        (**self).set(profile)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Signatures that identify a transient "try again" failure in provider output.
const BUSY_SIGNATURES: &[&str] = &["busy", "driver activation failed"];

/// Classifies provider error output as busy (retryable) or a hard failure.
pub fn classify_failure(output: &str) -> ProviderError {
    let lowered = output.to_lowercase();
    let message = output.trim().to_string();
    if BUSY_SIGNATURES.iter().any(|sig| lowered.contains(sig)) {
        ProviderError::Busy(message)
    } else {
        ProviderError::Failed(message)
    }
}

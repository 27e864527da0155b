use std::time::Duration;

use powershift_platform::{ProfileProvider, ProviderError};
use powershift_protocol::ProfileName;
use tracing::{debug, info, warn};

/// Outcome of one apply attempt, judged by reading the provider back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedResult {
    /// Provider profile before the attempt, `None` when unreadable.
    pub before: Option<ProfileName>,
    /// Provider profile after the attempt, `None` when unreadable.
    pub actual: Option<ProfileName>,
    /// Whether a set call was issued.
    pub attempted: bool,
    /// The read-back differs from `before`.
    pub changed: bool,
}

/// Drives the provider towards a target with bounded retries on busy errors.
#[derive(Debug, Clone)]
pub struct ApplyController {
    retries: u32,
    retry_delay: Duration,
}

impl ApplyController {
    pub fn new(retries: u32, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
        }
    }

    pub fn apply<P: ProfileProvider>(&self, provider: &P, target: ProfileName) -> AppliedResult {
        let before = match provider.get() {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "Failed to read active profile");
                None
            }
        };
        self.apply_from(provider, before, target)
    }

    /// Like [`ApplyController::apply`] with the pre-attempt profile already read.
    pub fn apply_from<P: ProfileProvider>(
        &self,
        provider: &P,
        before: Option<ProfileName>,
        target: ProfileName,
    ) -> AppliedResult {
        if before == Some(target) {
            debug!(profile = %target, "Profile already active");
            return AppliedResult {
                before,
                actual: before,
                attempted: false,
                changed: false,
            };
        }

        if let Err(e) = self.set_with_retry(provider, target) {
            warn!(profile = %target, error = %e, "Failed to set profile, retrying next tick");
        }

        let actual = match provider.get() {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "Failed to read back profile");
                None
            }
        };
        let changed = actual.is_some() && actual != before;

        if changed {
            info!(
                from = before.map(|p| p.as_str()).unwrap_or("unknown"),
                to = actual.map(|p| p.as_str()).unwrap_or("unknown"),
                "Profile changed"
            );
        } else if actual != Some(target) {
            debug!(profile = %target, ?actual, "Provider did not take the target");
        }

        AppliedResult {
            before,
            actual,
            attempted: true,
            changed,
        }
    }

    fn set_with_retry<P: ProfileProvider>(
        &self,
        provider: &P,
        target: ProfileName,
    ) -> Result<(), ProviderError> {
        let mut attempt = 0;
        loop {
            match provider.set(target) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_busy() && attempt < self.retries => {
                    attempt += 1;
                    debug!(attempt, retries = self.retries, error = %e, "Provider busy");
                    std::thread::sleep(self.retry_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    /// In-memory provider that records set calls.
    #[derive(Debug)]
    pub struct FakeProvider {
        pub active: Cell<Option<ProfileName>>,
        pub set_calls: Cell<u32>,
        /// Errors returned by upcoming set calls, front first.
        pub set_errors: RefCell<VecDeque<ProviderError>>,
        /// When false, successful sets leave the active profile untouched.
        pub honors_set: Cell<bool>,
    }

    impl FakeProvider {
        pub fn new(active: ProfileName) -> Self {
            Self {
                active: Cell::new(Some(active)),
                set_calls: Cell::new(0),
                set_errors: RefCell::new(VecDeque::new()),
                honors_set: Cell::new(true),
            }
        }

        pub fn unreadable() -> Self {
            let provider = Self::new(ProfileName::Balanced);
            provider.active.set(None);
            provider
        }

        pub fn fail_next_sets(&self, errors: impl IntoIterator<Item = ProviderError>) {
            self.set_errors.borrow_mut().extend(errors);
        }
    }

    impl ProfileProvider for FakeProvider {
        fn get(&self) -> Result<ProfileName, ProviderError> {
            self.active
                .get()
                .ok_or_else(|| ProviderError::Failed("no daemon".to_string()))
        }

        fn set(&self, profile: ProfileName) -> Result<(), ProviderError> {
            self.set_calls.set(self.set_calls.get() + 1);
            if let Some(err) = self.set_errors.borrow_mut().pop_front() {
                return Err(err);
            }
            if self.honors_set.get() {
                self.active.set(Some(profile));
            }
            Ok(())
        }
    }
}

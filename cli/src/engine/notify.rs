use std::time::Duration;

use powershift_platform::Notifier;
use powershift_protocol::{DecisionReason, ProfileName};
use tracing::{debug, warn};

use super::state::StateStore;

pub const NOTIFICATION_TITLE: &str = "Power Profile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn profile_changed(profile: ProfileName, reason: DecisionReason) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("{} mode activated ({})", profile.label(), reason),
        }
    }

    pub fn override_cleared() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: "Auto mode (override cleared)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Disabled,
    Silenced,
    Unavailable,
    CoolingDown,
    Failed,
}

/// Rate-limited notification sender.
///
/// Sends only when enabled, not silenced by the marker file, a transport is
/// available, and the cooldown since the last sent notification has passed.
pub struct NotificationGate<N> {
    notifier: N,
    enabled: bool,
    cooldown: Duration,
}

impl<N: Notifier> NotificationGate<N> {
    pub fn new(notifier: N, enabled: bool, cooldown: Duration) -> Self {
        Self {
            notifier,
            enabled,
            cooldown,
        }
    }

    pub fn notify(
        &self,
        store: &mut StateStore,
        notification: &Notification,
        now: i64,
    ) -> NotifyOutcome {
        let outcome = self.check(store, now);
        if outcome != NotifyOutcome::Sent {
            debug!(?outcome, body = %notification.body, "Notification suppressed");
            return outcome;
        }

        match self.notifier.send(&notification.title, &notification.body) {
            Ok(()) => {
                store.record_notified(now);
                NotifyOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "Failed to send notification");
                NotifyOutcome::Failed
            }
        }
    }

    fn check(&self, store: &StateStore, now: i64) -> NotifyOutcome {
        if !self.enabled {
            return NotifyOutcome::Disabled;
        }
        if store.is_silenced() {
            return NotifyOutcome::Silenced;
        }
        if !self.notifier.is_available() {
            return NotifyOutcome::Unavailable;
        }
        if let Some(last) = store.last_notified() {
            let elapsed = now.saturating_sub(last);
            // A clock that went backwards still waits out the cooldown.
            if elapsed < 0 || (elapsed as u64) < self.cooldown.as_secs() {
                return NotifyOutcome::CoolingDown;
            }
        }
        NotifyOutcome::Sent
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};

    use color_eyre::eyre::{eyre, Result};

    use super::*;

    #[derive(Debug)]
    pub struct FakeNotifier {
        pub available: Cell<bool>,
        pub fail: Cell<bool>,
        pub sent: RefCell<Vec<(String, String)>>,
    }

    impl FakeNotifier {
        pub fn new() -> Self {
            Self {
                available: Cell::new(true),
                fail: Cell::new(false),
                sent: RefCell::new(Vec::new()),
            }
        }

        pub fn count(&self) -> usize {
            self.sent.borrow().len()
        }
    }

    impl Notifier for FakeNotifier {
        fn is_available(&self) -> bool {
            self.available.get()
        }

        fn send(&self, title: &str, body: &str) -> Result<()> {
            if self.fail.get() {
                return Err(eyre!("no notification daemon"));
            }
            self.sent
                .borrow_mut()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }
}

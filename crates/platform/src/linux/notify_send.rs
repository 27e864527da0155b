use std::time::Duration;

use color_eyre::eyre::{eyre, Result};

use crate::command::{run_with_timeout, DEFAULT_COMMAND_TIMEOUT};
use crate::notifier::Notifier;

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "powershift";

/// Desktop notifications through libnotify's `notify-send`.
#[derive(Debug, Clone)]
pub struct NotifySend {
    available: bool,
    timeout: Duration,
}

impl Default for NotifySend {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl NotifySend {
    pub fn new(timeout: Duration) -> Self {
        Self {
            available: which::which(NOTIFY_SEND).is_ok(),
            timeout,
        }
    }
}

impl Notifier for NotifySend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn send(&self, title: &str, body: &str) -> Result<()> {
        let output = run_with_timeout(
            NOTIFY_SEND,
            &["--app-name", APP_NAME, "--icon", "power-profile-balanced-symbolic", title, body],
            self.timeout,
        )?;
        if output.success() {
            Ok(())
        } else {
            Err(eyre!("notify-send failed: {}", output.stderr.trim()))
        }
    }
}

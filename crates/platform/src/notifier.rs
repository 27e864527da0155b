//! Desktop notification transport.

use color_eyre::eyre::Result;

/// Fire-and-forget user-visible message emitter.
pub trait Notifier {
    /// Whether a transport is installed and usable.
    fn is_available(&self) -> bool;

    fn send(&self, title: &str, body: &str) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn send(&self, title: &str, body: &str) -> Result<()> {
        (**self).send(title, body)
    }
}

/// Notifier that never has a transport. Used when notifications are compiled
/// out of a command path or in tests that must not touch the desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn is_available(&self) -> bool {
        false
    }

    fn send(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

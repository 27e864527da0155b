//! System collaborators for powershift.
//!
//! This crate provides the narrow traits the decision engine talks to, plus
//! their Linux implementations:
//!
//! - [`ProfileProvider`] - reads and sets the active power profile
//!   (`powerprofilesctl`)
//! - [`SnapshotSource`] - samples load, temperatures, GPU utilization and
//!   short-window CPU busy time
//! - [`Notifier`] - desktop notifications (`notify-send`)
//!
//! # Example
//!
//! ```ignore
//! use powershift_platform::linux::{PowerProfilesCtl, SystemSampler};
//! use powershift_platform::{ProfileProvider, SamplerSettings, SnapshotSource};
//!
//! let provider = PowerProfilesCtl::default();
//! println!("Active: {}", provider.get()?);
//!
//! let mut sampler = SystemSampler::new(SamplerSettings::default());
//! println!("Load: {:.2}", sampler.snapshot().load1);
//! ```

mod command;
mod notifier;
mod persist;
mod provider;
mod sampler;

pub use command::{run_with_timeout, CommandOutput, DEFAULT_COMMAND_TIMEOUT};
pub use notifier::{Notifier, NullNotifier};
pub use persist::write_atomic;
pub use provider::{classify_failure, ProfileProvider, ProviderError};
pub use sampler::{SamplerSettings, SnapshotSource};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(not(target_os = "linux"))]
compile_error!("powershift-platform requires Linux (power-profiles-daemon, procfs, sysfs).");

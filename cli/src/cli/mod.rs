mod daemon;

pub use daemon::DaemonCommands;

use clap::{Parser, Subcommand, ValueEnum};
use powershift_protocol::ProfileName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    #[value(name = "power-saver", alias = "saver")]
    PowerSaver,
    Balanced,
    #[value(alias = "perf")]
    Performance,
}

impl From<ProfileArg> for ProfileName {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::PowerSaver => ProfileName::PowerSaver,
            ProfileArg::Balanced => ProfileName::Balanced,
            ProfileArg::Performance => ProfileName::Performance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run or control the switching daemon
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Pin a profile until `auto` is run
    #[command(alias = "pin")]
    Set { profile: ProfileArg },

    /// Clear the pinned profile and resume automatic switching
    Auto,

    /// Show the active profile, override and last metrics
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Enable or silence change notifications
    Notify { state: Toggle },

    Debug,

    Config {
        #[arg(long)]
        path: bool,

        #[arg(long)]
        reset: bool,

        #[arg(short, long)]
        edit: bool,
    },

    Logs {
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,

        #[arg(short, long)]
        follow: bool,
    },
}

/// Automatic power profile switching for power-profiles-daemon.
#[derive(Debug, Parser)]
#[command(name = "powershift", version, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

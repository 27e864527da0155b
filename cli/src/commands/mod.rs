pub mod config;
pub mod daemon;
pub mod debug;
pub mod logs;
pub mod notify;
pub mod set;
pub mod status;

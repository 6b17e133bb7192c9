//! Builds VMware ESXi installer images that carry a kickstart file for a
//! group of hosts, and reads that file back out of a built image.

pub mod cli;
pub mod config;
pub mod core;
pub mod iso;
pub mod logging;
pub mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

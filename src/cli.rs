use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::builder::DEFAULT_FIRSTBOOT_SCRIPT;
use crate::iso::extractor::DEFAULT_MOUNT_DIR;

/// Builds ESXi installer ISOs with an embedded kickstart file.
///
/// Builds share the mount point and the `temp` scratch directory, so run at
/// most one build per working directory and mount point at a time.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ksiso")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory receiving ksiso.log
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a custom ISO from the base ESXi ISO and a JSON host document
    Build {
        /// Input JSON file
        #[arg(short, long)]
        json: PathBuf,
        /// Suffix for the output ISO name (defaults to a timestamp)
        #[arg(short, long)]
        suffix: Option<String>,
        /// Script embedded in the %firstboot section
        #[arg(long, default_value = DEFAULT_FIRSTBOOT_SCRIPT)]
        firstboot: PathBuf,
        /// Loop-mount point for the base ISO
        #[arg(long, default_value = DEFAULT_MOUNT_DIR)]
        mount_dir: PathBuf,
        /// Also write a `<iso>.<algorithm>` checksum file
        #[arg(long)]
        checksum_file: bool,
    },
    /// Print the kickstart file embedded in an ISO
    ShowKs {
        /// ISO to inspect
        #[arg(short, long)]
        iso: PathBuf,
        /// Loop-mount point for the ISO
        #[arg(long, default_value = DEFAULT_MOUNT_DIR)]
        mount_dir: PathBuf,
    },
    /// Validate a JSON host document without touching any ISO
    Validate {
        /// Input JSON file
        #[arg(short, long)]
        json: PathBuf,
    },
}

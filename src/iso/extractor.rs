use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::{CommandRunner, ExternalCommand};

/// Default loop-mount point. Shared by every run on the host, so two
/// builds must not run at the same time with the same mount point.
pub const DEFAULT_MOUNT_DIR: &str = "/mnt/esxi_cdrom";

/// Loop-mounts installer images through a [`CommandRunner`]
pub struct IsoExtractor<'a> {
    runner: &'a dyn CommandRunner,
    mount_point: PathBuf,
}

impl<'a> IsoExtractor<'a> {
    pub fn new(runner: &'a dyn CommandRunner, mount_point: PathBuf) -> Self {
        Self {
            runner,
            mount_point,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Create a fresh mount point, removing a stale empty one first
    pub fn prepare_mount_point(&self) -> Result<()> {
        if self.mount_point.exists() {
            debug!("Removing stale mount point: {}", self.mount_point.display());
            std::fs::remove_dir(&self.mount_point).with_context(|| {
                format!("Failed to remove mount point: {}", self.mount_point.display())
            })?;
        }

        std::fs::create_dir_all(&self.mount_point).with_context(|| {
            format!("Failed to create mount point: {}", self.mount_point.display())
        })
    }

    pub fn mount(&self, iso_path: &Path) -> Result<()> {
        info!(
            "Mounting {} at {}",
            iso_path.display(),
            self.mount_point.display()
        );

        let command = ExternalCommand::new("mount")
            .args(["-o", "loop,ro"])
            .path_arg(iso_path)
            .path_arg(&self.mount_point);
        self.runner.run(&command, "Mounting ISO")?;
        Ok(())
    }

    pub fn unmount(&self) -> Result<()> {
        let command = ExternalCommand::new("umount").path_arg(&self.mount_point);
        self.runner.run(&command, "Unmounting ISO")?;
        Ok(())
    }

    pub fn remove_mount_point(&self) -> Result<()> {
        std::fs::remove_dir(&self.mount_point).with_context(|| {
            format!("Failed to remove mount point: {}", self.mount_point.display())
        })
    }

    /// Copy the full contents of `iso_path` into `extract_path`
    pub fn extract_iso(&self, iso_path: &Path, extract_path: &Path) -> Result<()> {
        info!(
            "Extracting ISO: {} to {}",
            iso_path.display(),
            extract_path.display()
        );

        self.prepare_mount_point()?;
        self.mount(iso_path)?;

        // `<mnt>/.` copies the contents, hidden entries included
        let command = ExternalCommand::new("cp")
            .arg("-r")
            .path_arg(&self.mount_point.join("."))
            .path_arg(extract_path);
        self.runner.run(&command, "Copying the ISO")?;

        self.unmount()?;
        self.remove_mount_point()?;

        info!("Successfully extracted ISO to: {}", extract_path.display());
        Ok(())
    }
}

use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::utils::{CommandRunner, ExternalCommand};

/// Output image name: the base name up to its first `.iso`, then the
/// suffix (or a `YYYYmmdd-HHMM` timestamp), then `.iso`
pub fn output_file_name(base_name: &str, suffix: Option<&str>) -> String {
    let timestamp;
    let suffix = match suffix {
        Some(suffix) => suffix,
        None => {
            timestamp = Local::now().format("%Y%m%d-%H%M").to_string();
            &timestamp
        }
    };
    let stem = base_name.split(".iso").next().unwrap_or(base_name);
    format!("{}-{}.iso", stem, suffix)
}

/// Re-authors a bootable ESXi image with `mkisofs`
pub struct IsoPackager<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> IsoPackager<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// El Torito layout the ESXi installer expects: `isolinux.bin` for BIOS
    /// and `efiboot.img` for EFI, both without emulation
    pub fn mkisofs_command(iso_fs: &Path, output_path: &Path) -> ExternalCommand {
        ExternalCommand::new("mkisofs")
            .args(["-relaxed-filenames", "-quiet", "-J", "-R", "-o"])
            .path_arg(output_path)
            .args([
                "-b",
                "isolinux.bin",
                "-c",
                "boot.cat",
                "-no-emul-boot",
                "-boot-load-size",
                "4",
                "-boot-info-table",
                "-eltorito-alt-boot",
                "-e",
                "efiboot.img",
                "-no-emul-boot",
            ])
            .path_arg(iso_fs)
    }

    pub fn package_iso(&self, iso_fs: &Path, output_path: &Path) -> Result<PathBuf> {
        info!("Packaging final ISO: {}", output_path.display());

        let command = Self::mkisofs_command(iso_fs, output_path);
        self.runner
            .run(&command, "Create an ISO with the updated KS file")?;

        info!("Final ISO created: {}", output_path.display());
        Ok(output_path.to_path_buf())
    }
}

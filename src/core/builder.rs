use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::validation::{self, ValidationError};
use crate::config::ImageConfig;
use crate::core::kickstart::{KickstartRenderer, KICKSTART_FILE_NAME};
use crate::iso::{boot, extractor::DEFAULT_MOUNT_DIR, packager, IsoExtractor, IsoPackager};
use crate::utils::fs::{self as fsutil, FileSystemManager};
use crate::utils::{ChecksumAlgorithm, ChecksumVerifier, CommandRunner};

/// Default first-boot script, relative to the working directory
pub const DEFAULT_FIRSTBOOT_SCRIPT: &str = "firstboot-scripts.txt";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory holding the base image; the scratch tree and the output
    /// image are created here too
    pub work_dir: PathBuf,
    pub mount_dir: PathBuf,
    pub firstboot_script: PathBuf,
    pub suffix: Option<String>,
    pub write_checksum_file: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            mount_dir: PathBuf::from(DEFAULT_MOUNT_DIR),
            firstboot_script: PathBuf::from(DEFAULT_FIRSTBOOT_SCRIPT),
            suffix: None,
            write_checksum_file: false,
        }
    }
}

/// Builds a kickstart-enabled installer image from a validated document.
///
/// Every step is a hard gate. Once the scratch tree exists there is no
/// rollback: a failure leaves the scratch tree and possibly the mount point
/// behind for the operator to inspect and remove.
pub struct Builder<'a> {
    config: ImageConfig,
    encrypted_root_password: String,
    options: BuildOptions,
    runner: &'a dyn CommandRunner,
    checksum_verifier: ChecksumVerifier,
    disk_space_gate: fn(&Path, &Path) -> Result<bool>,
}

impl<'a> Builder<'a> {
    pub fn new(
        config: ImageConfig,
        encrypted_root_password: String,
        options: BuildOptions,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            encrypted_root_password,
            options,
            runner,
            checksum_verifier: ChecksumVerifier::new(),
            disk_space_gate: fsutil::validate_disk_space,
        }
    }

    fn base_iso_path(&self) -> PathBuf {
        self.options
            .work_dir
            .join(self.config.esxi_iso_file_name.trim())
    }

    fn firstboot_script_path(&self) -> PathBuf {
        self.options.work_dir.join(&self.options.firstboot_script)
    }

    /// Run the full build and return the path of the new image
    pub fn build(&self) -> Result<PathBuf> {
        info!("Starting ISO build process");

        let base_iso = self.preflight()?;

        let fs_manager = FileSystemManager::new(&self.options.work_dir);
        fs_manager
            .create_working_directory()
            .context("Failed to create working directory")?;
        let tree = fs_manager.get_working_dir();

        IsoExtractor::new(self.runner, self.options.mount_dir.clone())
            .extract_iso(&base_iso, tree)?;

        boot::configure_kickstart_boot(tree)?;

        self.write_kickstart(&fs_manager)?;

        let output_name =
            packager::output_file_name(self.config.esxi_iso_file_name.trim(), self.options.suffix.as_deref());
        let output = IsoPackager::new(self.runner)
            .package_iso(tree, &self.options.work_dir.join(output_name))?;

        let algorithm = ChecksumAlgorithm::from_digest(&self.config.iso_checksum)?;
        let checksum = self
            .checksum_verifier
            .calculate_checksum(&output, algorithm)?;
        if self.options.write_checksum_file {
            self.checksum_verifier
                .generate_checksum_file(&output, &checksum, algorithm)?;
        }

        fs_manager.cleanup()?;

        info!(
            "The ESXi image '{}' has been created with the installation script. Its {} checksum is: {}",
            output.display(),
            algorithm.as_str().to_uppercase(),
            checksum
        );
        Ok(output)
    }

    /// Gates that run before anything on disk is touched
    fn preflight(&self) -> Result<PathBuf> {
        if let Err(e) = validation::check_license(&self.config) {
            error!("{}", e);
            return Err(e.into());
        }

        let violations = validation::report_violations(&self.config);
        if violations > 0 {
            return Err(ValidationError::InvalidDocument(violations).into());
        }

        let base_iso = self.base_iso_path();
        let work_dir = self.options.work_dir.display().to_string();
        let required = [
            (self.config.esxi_iso_file_name.trim().to_string(), base_iso.clone()),
            (
                self.options.firstboot_script.display().to_string(),
                self.firstboot_script_path(),
            ),
        ];
        for (name, path) in required {
            if !path.is_file() {
                error!(
                    "The file named '{}' does not exist in the '{}' directory. Exiting...",
                    name, work_dir
                );
                return Err(ValidationError::FileNotFound(path.display().to_string()).into());
            }
        }

        if !(self.disk_space_gate)(&base_iso, &self.options.work_dir)? {
            return Err(ValidationError::InsufficientSpace(work_dir).into());
        }

        if let Err(e) = self
            .checksum_verifier
            .verify_file(&base_iso, &self.config.iso_checksum)
        {
            error!("{}. Exiting...", e);
            return Err(e);
        }

        Ok(base_iso)
    }

    fn write_kickstart(&self, fs_manager: &FileSystemManager) -> Result<()> {
        let script_path = self.firstboot_script_path();
        let firstboot = std::fs::read_to_string(&script_path).with_context(|| {
            format!("Failed to read first-boot script: {}", script_path.display())
        })?;

        let kickstart =
            KickstartRenderer::new(&self.config, &self.encrypted_root_password, &firstboot)
                .render()?;

        let path = fs_manager.write_file(KICKSTART_FILE_NAME, &kickstart)?;
        debug!("Wrote {} ({} bytes)", path.display(), kickstart.len());
        Ok(())
    }
}

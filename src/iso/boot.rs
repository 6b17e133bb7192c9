use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::kickstart::KICKSTART_FILE_NAME;
use crate::utils::fs::replace_case_insensitive;

/// BIOS and EFI copies of the ESXi boot loader configuration
pub const BOOT_CONFIG_FILES: [&str; 2] = ["boot.cfg", "efi/boot/boot.cfg"];

/// Default kernel option lines shipped by the installer, in patch order
pub const KERNELOPT_VARIANTS: [&str; 3] = [
    "kernelopt=runweasel",
    "kernelopt=cdromBoot runweasel",
    "kernelopt=runweasel cdromBoot",
];

/// Kernel options that point the installer at the embedded kickstart file
pub fn kickstart_kernelopt() -> String {
    format!("kernelopt=runweasel ks=cdrom:/{}", KICKSTART_FILE_NAME)
}

/// Rewrite the default kernel options of both boot configurations under
/// `extraction_dir` so the installer loads the kickstart file
pub fn configure_kickstart_boot(extraction_dir: &Path) -> Result<()> {
    let configs: Vec<PathBuf> = BOOT_CONFIG_FILES
        .iter()
        .map(|file| extraction_dir.join(file))
        .collect();

    if let Some(missing) = configs.iter().find(|path| !path.is_file()) {
        return Err(anyhow!(
            "Boot configuration file not found: {}",
            missing.display()
        ));
    }

    let replacement = kickstart_kernelopt();
    for variant in KERNELOPT_VARIANTS {
        for config in &configs {
            debug!("Patching '{}' in {}", variant, config.display());
            replace_case_insensitive(config, variant, &replacement)?;
        }
    }

    info!("Boot configuration updated to load {}", KICKSTART_FILE_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree_with_boot_configs(bios: &str, efi: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("efi/boot")).unwrap();
        std::fs::write(dir.path().join("boot.cfg"), bios).unwrap();
        std::fs::write(dir.path().join("efi/boot/boot.cfg"), efi).unwrap();
        dir
    }

    fn read(dir: &TempDir, file: &str) -> String {
        std::fs::read_to_string(dir.path().join(file)).unwrap()
    }

    #[test]
    fn test_patches_both_configs() {
        let dir = tree_with_boot_configs(
            "bootstate=0\nkernelopt=runweasel\nmodules=/b.b00\n",
            "bootstate=0\nKERNELOPT=RUNWEASEL\n",
        );

        configure_kickstart_boot(dir.path()).unwrap();

        assert_eq!(
            read(&dir, "boot.cfg"),
            "bootstate=0\nkernelopt=runweasel ks=cdrom:/KS.CFG\nmodules=/b.b00\n"
        );
        assert_eq!(
            read(&dir, "efi/boot/boot.cfg"),
            "bootstate=0\nkernelopt=runweasel ks=cdrom:/KS.CFG\n"
        );
    }

    #[test]
    fn test_cdromboot_variants() {
        let dir = tree_with_boot_configs(
            "kernelopt=cdromBoot runweasel\n",
            "kernelopt=runweasel cdromBoot\n",
        );

        configure_kickstart_boot(dir.path()).unwrap();

        assert_eq!(read(&dir, "boot.cfg"), "kernelopt=runweasel ks=cdrom:/KS.CFG\n");
        // The first variant is a prefix of the third one and wins
        assert_eq!(
            read(&dir, "efi/boot/boot.cfg"),
            "kernelopt=runweasel ks=cdrom:/KS.CFG cdromBoot\n"
        );
    }

    #[test]
    fn test_missing_efi_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("boot.cfg"), "kernelopt=runweasel\n").unwrap();

        let err = configure_kickstart_boot(dir.path()).unwrap_err();
        assert!(err.to_string().contains("efi/boot/boot.cfg"));
        // Nothing is patched when a file is missing
        assert_eq!(read(&dir, "boot.cfg"), "kernelopt=runweasel\n");
    }
}

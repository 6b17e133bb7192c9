use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::core::kickstart::KICKSTART_FILE_NAME;
use crate::iso::IsoExtractor;
use crate::utils::CommandRunner;

/// Prints the kickstart file embedded in a built image
pub struct Inspector<'a> {
    extractor: IsoExtractor<'a>,
}

impl<'a> Inspector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, mount_point: PathBuf) -> Self {
        Self {
            extractor: IsoExtractor::new(runner, mount_point),
        }
    }

    /// Mount `iso_path` read-only and log its `KS.CFG`.
    ///
    /// Returns `None` when the image carries no kickstart file. The image is
    /// unmounted and the mount point removed whether or not reading worked.
    pub fn show_kickstart(&self, iso_path: &Path) -> Result<Option<String>> {
        self.extractor.prepare_mount_point()?;
        self.extractor.mount(iso_path)?;

        let contents = self.read_kickstart();

        let unmounted = self.extractor.unmount();
        if let Err(e) = &unmounted {
            warn!("Failed to unmount {}: {:#}", self.extractor.mount_point().display(), e);
        }
        unmounted?;
        self.extractor.remove_mount_point()?;

        contents
    }

    fn read_kickstart(&self) -> Result<Option<String>> {
        let ks_path = self.extractor.mount_point().join(KICKSTART_FILE_NAME);
        if !ks_path.is_file() {
            error!("The KS file is not present in the ISO");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&ks_path)
            .with_context(|| format!("Failed to read {}", ks_path.display()))?;
        info!(
            "\n######## START OF KS FILE ########\n{}\n######## END OF KS FILE ########",
            contents
        );
        Ok(Some(contents))
    }
}

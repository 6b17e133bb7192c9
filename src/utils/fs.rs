use anyhow::{Context, Result};
use rand::Rng;
use regex::{NoExpand, RegexBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Name of the scratch directory created under the working directory
pub const SCRATCH_DIR_NAME: &str = "temp";

const RANDOM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RANDOM_LENGTH: usize = 5;

const SIZE_SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Owns the scratch tree `<base>/temp/<RANDOM>` that holds the working copy
/// of an image during a build
pub struct FileSystemManager {
    scratch_root: PathBuf,
    working_dir: PathBuf,
}

impl FileSystemManager {
    pub fn new(base_dir: &Path) -> Self {
        let scratch_root = base_dir.join(SCRATCH_DIR_NAME);
        let working_dir = scratch_root.join(random_name());
        Self {
            scratch_root,
            working_dir,
        }
    }

    pub fn create_working_directory(&self) -> Result<()> {
        info!("Creating working directory: {}", self.working_dir.display());

        if self.working_dir.exists() {
            warn!("Working directory already exists, cleaning up first");
            std::fs::remove_dir_all(&self.working_dir).with_context(|| {
                format!("Failed to remove stale directory: {}", self.working_dir.display())
            })?;
        }

        std::fs::create_dir_all(&self.working_dir).with_context(|| {
            format!(
                "Failed to create working directory: {}",
                self.working_dir.display()
            )
        })?;

        Ok(())
    }

    /// Remove the working tree and the scratch directory above it
    pub fn cleanup(&self) -> Result<()> {
        for dir in [&self.working_dir, &self.scratch_root] {
            if dir.exists() {
                std::fs::remove_dir_all(dir)
                    .with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
            }
        }

        debug!(
            "Temp directory '{}' and '{}' have been deleted.",
            self.working_dir.display(),
            self.scratch_root.display()
        );
        Ok(())
    }

    pub fn get_working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.working_dir.join(name);
        debug!("Writing file: {}", path.display());

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        Ok(path)
    }
}

/// Five characters from `A-Z0-9`
pub fn random_name() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_LENGTH)
        .map(|_| RANDOM_ALPHABET[rng.gen_range(0..RANDOM_ALPHABET.len())] as char)
        .collect()
}

/// Size in bytes plus a human-readable rendering
pub fn file_size(path: &Path) -> Result<(u64, String)> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;
    let bytes = metadata.len();
    Ok((bytes, convert_size(bytes)))
}

/// Scale by 1024 up to TB, two decimals: `1024 -> "1.00 KB"`
pub fn convert_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut index = 0;
    while size >= 1024.0 && index < SIZE_SUFFIXES.len() - 1 {
        size /= 1024.0;
        index += 1;
    }
    format!("{:.2} {}", size, SIZE_SUFFIXES[index])
}

/// Bytes available to unprivileged users on the filesystem holding `path`
#[cfg(unix)]
pub fn available_space(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path)
        .with_context(|| format!("Failed to query free space for: {}", path.display()))?;
    #[allow(clippy::unnecessary_cast)]
    let available = stat.blocks_available() as u64 * stat.fragment_size() as u64;
    Ok(available)
}

#[cfg(not(unix))]
pub fn available_space(path: &Path) -> Result<u64> {
    Err(anyhow::anyhow!(
        "Unsupported platform: cannot query free space for {}",
        path.display()
    ))
}

pub fn has_free_space(path: &Path, required: u64) -> Result<bool> {
    Ok(available_space(path)? >= required)
}

/// Require twice the image size free in `dir` before copying it there
pub fn validate_disk_space(iso: &Path, dir: &Path) -> Result<bool> {
    check_disk_space(iso, dir, has_free_space)
}

/// [`validate_disk_space`] with the free-space test supplied by the caller
pub fn check_disk_space<F>(iso: &Path, dir: &Path, has_space: F) -> Result<bool>
where
    F: Fn(&Path, u64) -> Result<bool>,
{
    let (size_bytes, size_readable) = file_size(iso)?;
    debug!("The size of '{}' is {}.", iso.display(), size_readable);

    let required = size_bytes.saturating_mul(2);
    if has_space(dir, required)? {
        debug!("The required disk space is: {}", convert_size(required));
        info!("The directory '{}' has sufficient disk space.", dir.display());
        return Ok(true);
    }

    error!(
        "There is not enough disk space in the {} directory. Exiting...",
        dir.display()
    );
    Ok(false)
}

/// Replace every occurrence of `search`, compared case-insensitively and
/// taken literally, then rewrite the whole file
pub fn replace_case_insensitive(path: &Path, search: &str, replacement: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let pattern = RegexBuilder::new(&regex::escape(search))
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Failed to build search pattern for: {search}"))?;

    let updated = pattern.replace_all(&contents, NoExpand(replacement));

    std::fs::write(path, updated.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}

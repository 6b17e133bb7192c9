pub mod checksum;
pub mod command;
pub mod fs;

pub use checksum::{ChecksumAlgorithm, ChecksumVerifier};
pub use command::{CommandError, CommandRunner, ExternalCommand, SystemCommandRunner};
pub use fs::FileSystemManager;

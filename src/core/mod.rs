pub mod builder;
pub mod inspector;
pub mod kickstart;
pub mod password;

pub use builder::{BuildOptions, Builder};
pub use inspector::Inspector;
pub use kickstart::KickstartRenderer;

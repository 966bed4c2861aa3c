mod error;
mod target;
mod version;

pub use error::LaunchError;
pub use target::LaunchTarget;
pub use version::{VersionFamily, VersionKey};

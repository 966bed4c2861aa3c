use std::path::{Path, PathBuf};

use crate::{VersionFamily, VersionKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    executable: PathBuf,
    arguments: Vec<String>,
    version: VersionKey,
}

impl LaunchTarget {
    pub fn new(executable: impl Into<PathBuf>, arguments: Vec<String>, version: VersionKey) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            version,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn version(&self) -> &VersionKey {
        &self.version
    }

    pub fn family(&self) -> VersionFamily {
        self.version.family()
    }

    /// Passthrough arguments as the single command line handed to the child:
    /// positional order kept, separated by one space.
    pub fn argument_line(&self) -> String {
        self.arguments.join(" ")
    }
}

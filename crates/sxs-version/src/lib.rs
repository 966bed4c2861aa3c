mod pe;
mod version_info;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};

use sxs_core::{LaunchError, VersionFamily, VersionKey};
use thiserror::Error;
use tracing::debug;

pub use pe::find_version_resource;
pub use version_info::{parse_version_info, FileVersionInfo};

/// `FileDescription` carried by every Unity editor executable.
pub const UNITY_EDITOR_DESCRIPTION: &str = "Unity Editor";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no file exists at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} has no usable version metadata: {reason}", path.display())]
    VersionMetadataMissing { path: PathBuf, reason: String },
}

impl From<ResolveError> for LaunchError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { path } => LaunchError::TargetNotFound { path },
            ResolveError::VersionMetadataMissing { path, reason } => {
                LaunchError::IdentityMismatch { path, reason }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub key: VersionKey,
    pub family: VersionFamily,
    pub info: FileVersionInfo,
}

pub fn resolve(path: &Path) -> Result<ResolvedVersion, ResolveError> {
    resolve_with_identity(path, UNITY_EDITOR_DESCRIPTION)
}

pub fn resolve_with_identity(
    path: &Path,
    expected_description: &str,
) -> Result<ResolvedVersion, ResolveError> {
    if !path.is_file() {
        return Err(ResolveError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let missing = |reason: String| ResolveError::VersionMetadataMissing {
        path: path.to_path_buf(),
        reason,
    };

    let image = fs::read(path).map_err(|err| missing(format!("failed to read file: {err}")))?;
    let info = read_file_version_info(&image).map_err(|err| missing(format!("{err:#}")))?;

    if info.file_version.as_deref().unwrap_or_default().is_empty() {
        return Err(missing("FileVersion string is empty".to_string()));
    }
    match info.file_description.as_deref() {
        Some(description) if description == expected_description => {}
        Some(description) => {
            return Err(missing(format!(
                "FileDescription is '{description}', expected '{expected_description}'"
            )))
        }
        None => return Err(missing("FileDescription string is missing".to_string())),
    }

    let key = info.version_key();
    debug!(path = %path.display(), version = %key, "resolved editor version");
    Ok(ResolvedVersion {
        family: key.family(),
        key,
        info,
    })
}

/// Parses the version resource out of a complete PE image.
pub fn read_file_version_info(image: &[u8]) -> anyhow::Result<FileVersionInfo> {
    let resource = find_version_resource(image)?;
    parse_version_info(resource)
}

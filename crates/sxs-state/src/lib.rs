mod registry;

#[cfg(any(test, feature = "fixtures"))]
pub mod memory;

use anyhow::Result;
use sxs_core::{LaunchError, VersionFamily};
use thiserror::Error;

pub use registry::{
    family_container_path, run_reg_command, RegOutput, RegistryBackend, RegistryContainer,
    UNITY_PREFERENCES_KEY,
};

/// Name prefix of the editor's "last opened project" entry. The suffix is a
/// hash chosen by the editor and may change between editor sessions.
pub const PATH_ENTRY_PREFIX: &str = "kProjectBasePath_";

#[derive(Debug, Error)]
pub enum StateOpenError {
    #[error("state container {container} does not exist")]
    Missing { container: String },

    #[error("access to state container {container} was denied: {message}")]
    PermissionDenied { container: String, message: String },

    #[error("failed to open state container {container}: {message}")]
    Failed { container: String, message: String },
}

impl From<StateOpenError> for LaunchError {
    fn from(err: StateOpenError) -> Self {
        match err {
            StateOpenError::Missing { container } => LaunchError::StateInaccessible { container },
            StateOpenError::PermissionDenied { message, .. }
            | StateOpenError::Failed { message, .. } => LaunchError::StateAccess { message },
        }
    }
}

/// An opened, version-family scoped set of named string entries.
///
/// Every mutation is committed before it returns; a child process started
/// afterwards observes it.
pub trait StateContainer {
    fn name(&self) -> &str;

    /// Entry names in container order.
    fn entry_names(&mut self) -> Result<Vec<String>>;

    fn get_entry(&mut self, name: &str) -> Result<Option<String>>;

    fn set_entry(&mut self, name: &str, value: &str) -> Result<()>;

    /// Deleting an absent entry is not an error.
    fn delete_entry(&mut self, name: &str) -> Result<()>;

    fn close(self) -> Result<()>
    where
        Self: Sized;
}

pub trait StateBackend {
    type Container: StateContainer;

    fn open(
        &mut self,
        family: VersionFamily,
        writable: bool,
    ) -> Result<Self::Container, StateOpenError>;
}

/// Scans the container for the first entry named with [`PATH_ENTRY_PREFIX`].
///
/// Never cache the result: the editor may rename the entry while it runs.
pub fn find_path_entry_name<C: StateContainer + ?Sized>(container: &mut C) -> Result<Option<String>> {
    Ok(container
        .entry_names()?
        .into_iter()
        .find(|name| name.starts_with(PATH_ENTRY_PREFIX)))
}

pub fn get_entry_or<C: StateContainer + ?Sized>(
    container: &mut C,
    name: &str,
    default: &str,
) -> Result<String> {
    if name.is_empty() {
        return Ok(default.to_string());
    }
    Ok(container
        .get_entry(name)?
        .unwrap_or_else(|| default.to_string()))
}

use std::path::PathBuf;

use thiserror::Error;

/// Terminal, user-visible outcomes of a launch attempt. None are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("You must supply the path to a Unity editor executable (and optionally arguments for the editor).")]
    Usage,

    #[error("Supplied executable not found. Please make sure the file exists: {}", path.display())]
    TargetNotFound { path: PathBuf },

    #[error("Supplied executable is not the Unity Editor. Please double-check the file path: {} ({reason})", path.display())]
    IdentityMismatch { path: PathBuf, reason: String },

    #[error("The following error occurred while trying to access Unity's registry settings:\n\n{message}")]
    StateAccess { message: String },

    #[error("Unity's registry settings could not be accessed ({container}). You may not have sufficient system permissions.")]
    StateInaccessible { container: String },

    #[error("The Unity editor could not be started: {message}")]
    LaunchFailed { message: String },

    #[error("Launcher settings could not be saved: {message}")]
    SettingsWrite { message: String },

    #[error("Launcher settings location could not be determined: {message}")]
    SettingsLocation { message: String },
}

impl LaunchError {
    /// Stable short code, used as the log field for aborts.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::TargetNotFound { .. } => "target-not-found",
            Self::IdentityMismatch { .. } => "identity-mismatch",
            Self::StateAccess { .. } => "state-access",
            Self::StateInaccessible { .. } => "state-inaccessible",
            Self::LaunchFailed { .. } => "launch-failed",
            Self::SettingsWrite { .. } => "settings-write",
            Self::SettingsLocation { .. } => "settings-location",
        }
    }
}

use std::path::PathBuf;

use anyhow::Result;
use sxs_core::{LaunchError, LaunchTarget, VersionKey};
use sxs_settings::{Settings, SettingsStore, VersionPathMap};
use sxs_state::{
    find_path_entry_name, get_entry_or, StateBackend, StateContainer, StateOpenError,
};
use tracing::{error, info, warn};

use crate::launcher::ChildExit;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LaunchRequest {
    pub(crate) executable: Option<String>,
    pub(crate) arguments: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LaunchOptions {
    pub(crate) clear_unmapped: bool,
}

/// What happened to the path entry before the editor started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PreSwap {
    /// One-time reset on the very first run of the launcher.
    FirstRunCleared { entry: Option<String> },
    Restored { entry: String, path: String },
    /// A path is stored for this version but the editor has no entry to receive it.
    NoEntryToRestore,
    ClearedUnmapped { entry: String },
    Untouched,
}

/// What was recorded from the path entry after the editor exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Capture {
    Recorded {
        entry: String,
        path: String,
        previous: Option<String>,
    },
    EmptyEntry { entry: String },
    NoEntry,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LaunchReport {
    pub(crate) target: LaunchTarget,
    pub(crate) pre_swap: PreSwap,
    pub(crate) exit: ChildExit,
    pub(crate) capture: Capture,
}

/// Init step: the executable argument with stray double quotes removed,
/// which must name an existing file.
pub(crate) fn executable_path(request: &LaunchRequest) -> Result<PathBuf, LaunchError> {
    let raw = request
        .executable
        .as_deref()
        .map(|value| value.replace('"', ""))
        .filter(|value| !value.trim().is_empty())
        .ok_or(LaunchError::Usage)?;
    let path = PathBuf::from(raw);
    if !path.is_file() {
        return Err(LaunchError::TargetNotFound { path });
    }
    Ok(path)
}

/// Swaps the per-version path into the editor's preferences, runs the
/// editor to completion, and records whatever path it left behind.
///
/// Settings are saved exactly once, after the editor exits. Any failure
/// before launch returns without saving.
pub(crate) fn run_launch<Backend, Launch>(
    request: LaunchRequest,
    store: &SettingsStore,
    backend: &mut Backend,
    options: LaunchOptions,
    mut launch: Launch,
) -> Result<LaunchReport, LaunchError>
where
    Backend: StateBackend,
    Launch: FnMut(&LaunchTarget) -> Result<ChildExit>,
{
    let mut settings = store.load();
    let executable = executable_path(&request)?;

    let resolved = sxs_version::resolve(&executable)?;
    let target = LaunchTarget::new(executable, request.arguments, resolved.key);
    info!(
        executable = %target.executable().display(),
        version = %target.version(),
        family = %target.family(),
        "resolved editor"
    );

    let mut container = backend
        .open(target.family(), true)
        .map_err(|err| {
            log_open_failure(&err);
            LaunchError::from(err)
        })?;

    let pre_swap = match pre_swap(&mut container, &mut settings, target.version(), options) {
        Ok(pre_swap) => pre_swap,
        Err(err) => {
            let message = format!("{err:#}");
            error!(error = %message, "failed to prepare editor preferences");
            close_container(container);
            return Err(LaunchError::StateAccess { message });
        }
    };
    info!(outcome = ?pre_swap, "prepared editor preferences");

    let exit = match launch(&target) {
        Ok(exit) => exit,
        Err(err) => {
            let message = format!("{err:#}");
            error!(error = %message, "failed to launch editor");
            close_container(container);
            return Err(LaunchError::LaunchFailed { message });
        }
    };
    info!(code = ?exit.code, "editor exited");

    let capture = match capture_path(&mut container, &mut settings.versions, target.version()) {
        Ok(capture) => capture,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to read project path after editor exit");
            Capture::Failed
        }
    };
    info!(outcome = ?capture, "captured editor preferences");

    close_container(container);
    store.save(&settings).map_err(|err| LaunchError::SettingsWrite {
        message: format!("{err:#}"),
    })?;

    Ok(LaunchReport {
        target,
        pre_swap,
        exit,
        capture,
    })
}

pub(crate) fn pre_swap<C: StateContainer>(
    container: &mut C,
    settings: &mut Settings,
    key: &VersionKey,
    options: LaunchOptions,
) -> Result<PreSwap> {
    let entry = find_path_entry_name(container)?;

    if !settings.first_run_completed {
        if let Some(name) = &entry {
            container.delete_entry(name)?;
        }
        settings.first_run_completed = true;
        return Ok(PreSwap::FirstRunCleared { entry });
    }

    match (settings.versions.get(key), entry) {
        (Some(path), Some(name)) => {
            container.set_entry(&name, path)?;
            Ok(PreSwap::Restored {
                entry: name,
                path: path.to_string(),
            })
        }
        (Some(_), None) => Ok(PreSwap::NoEntryToRestore),
        (None, Some(name)) if options.clear_unmapped => {
            container.delete_entry(&name)?;
            Ok(PreSwap::ClearedUnmapped { entry: name })
        }
        (None, _) => Ok(PreSwap::Untouched),
    }
}

/// Rescans for the entry: the editor may have renamed it during its session.
pub(crate) fn capture_path<C: StateContainer>(
    container: &mut C,
    versions: &mut VersionPathMap,
    key: &VersionKey,
) -> Result<Capture> {
    let Some(entry) = find_path_entry_name(container)? else {
        return Ok(Capture::NoEntry);
    };
    let path = get_entry_or(container, &entry, "")?;
    if path.is_empty() {
        return Ok(Capture::EmptyEntry { entry });
    }

    let previous = versions.upsert(key, path.clone());
    Ok(Capture::Recorded {
        entry,
        path,
        previous,
    })
}

fn close_container<C: StateContainer>(container: C) {
    if let Err(err) = container.close() {
        warn!(error = %format!("{err:#}"), "failed to close editor preferences");
    }
}

fn log_open_failure(err: &StateOpenError) {
    match err {
        StateOpenError::Missing { container } => warn!(
            container = %container,
            "editor preferences do not exist yet; start this editor version once without the launcher"
        ),
        StateOpenError::PermissionDenied { container, message } => error!(
            container = %container,
            error = %message,
            "permission denied opening editor preferences"
        ),
        StateOpenError::Failed { container, message } => error!(
            container = %container,
            error = %message,
            "failed to open editor preferences"
        ),
    }
}

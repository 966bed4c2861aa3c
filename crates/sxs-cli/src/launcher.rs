use std::process::Command;

use anyhow::{Context, Result};
use sxs_core::LaunchTarget;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChildExit {
    /// `None` when the process was terminated by a signal.
    pub(crate) code: Option<i32>,
}

pub(crate) fn build_child_command(target: &LaunchTarget) -> Command {
    let mut command = Command::new(target.executable());
    apply_arguments(&mut command, target);
    command
}

// The editor parses its own command line, so it gets the joined line verbatim.
#[cfg(windows)]
fn apply_arguments(command: &mut Command, target: &LaunchTarget) {
    use std::os::windows::process::CommandExt;

    if !target.arguments().is_empty() {
        command.raw_arg(target.argument_line());
    }
}

#[cfg(not(windows))]
fn apply_arguments(command: &mut Command, target: &LaunchTarget) {
    command.args(target.arguments());
}

/// Starts the editor with inherited stdio and blocks until it exits.
pub(crate) fn launch_and_wait(target: &LaunchTarget) -> Result<ChildExit> {
    let mut child = build_child_command(target)
        .spawn()
        .with_context(|| format!("failed to start {}", target.executable().display()))?;
    info!(pid = child.id(), "editor started; waiting for it to exit");

    let status = child.wait().with_context(|| {
        format!(
            "failed waiting for {} to exit",
            target.executable().display()
        )
    })?;
    Ok(ChildExit {
        code: status.code(),
    })
}

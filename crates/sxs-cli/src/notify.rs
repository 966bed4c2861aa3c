use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use sxs_core::LaunchError;

pub(crate) const NOTICE_TITLE: &str = "UnitySXS";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(stderr_is_terminal: bool) -> OutputStyle {
    if stderr_is_terminal {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(std::io::stderr().is_terminal())
}

/// The single notice shown to the user when a launch aborts.
pub(crate) fn render_failure(style: OutputStyle, err: &LaunchError) -> String {
    let message = format!("{NOTICE_TITLE}: {err}");
    match style {
        OutputStyle::Plain => message,
        OutputStyle::Rich => {
            let badge = match err {
                LaunchError::StateAccess { .. }
                | LaunchError::StateInaccessible { .. }
                | LaunchError::LaunchFailed { .. }
                | LaunchError::SettingsWrite { .. }
                | LaunchError::SettingsLocation { .. } => colorize(error_style(), "[ERROR]"),
                _ => colorize(warning_style(), "[WARN]"),
            };
            format!("{badge} {message}")
        }
    }
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn warning_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightYellow.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};
use sxs_core::LaunchError;
use sxs_settings::{default_settings_root, SettingsLayout, SettingsStore};
use sxs_state::RegistryBackend;
use tracing::debug;

mod launcher;
mod logging;
mod notify;
mod orchestrator;

use launcher::launch_and_wait;
use logging::init_logging;
use notify::{current_output_style, render_failure};
use orchestrator::{executable_path, run_launch, LaunchOptions, LaunchRequest};

#[derive(Parser, Debug)]
#[command(name = "unity-sxs")]
#[command(
    about = "Launch a Unity editor while keeping its last opened project separate per exact editor version",
    long_about = None
)]
struct Cli {
    /// Settings file to use instead of the per-user default.
    #[arg(long)]
    settings_file: Option<PathBuf>,
    /// Also clear the remembered project when this exact version has none stored yet.
    #[arg(long)]
    clear_unmapped: bool,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Path to the Unity editor executable, followed by arguments passed
    /// through to the editor unchanged.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "EDITOR_EXE [EDITOR_ARGS]"
    )]
    command: Vec<String>,
}

impl Cli {
    // Option parsing stops at the executable; everything after it belongs to the editor.
    fn launch_request(&self) -> LaunchRequest {
        match self.command.split_first() {
            Some((executable, arguments)) => LaunchRequest {
                executable: Some(executable.clone()),
                arguments: arguments.to_vec(),
            },
            None => LaunchRequest::default(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(code = err.code(), "launch aborted");
            eprintln!("{}", render_failure(current_output_style(), &err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<(), LaunchError> {
    let request = cli.launch_request();
    let store = prepare_store(&request, cli.settings_file, default_settings_root)?;
    let options = LaunchOptions {
        clear_unmapped: cli.clear_unmapped,
    };
    let mut backend = RegistryBackend::system();

    run_launch(request, &store, &mut backend, options, launch_and_wait).map(|_| ())
}

/// Usage and missing-file errors are reported before the settings location is resolved.
fn prepare_store<DefaultRoot>(
    request: &LaunchRequest,
    settings_file: Option<PathBuf>,
    default_root: DefaultRoot,
) -> Result<SettingsStore, LaunchError>
where
    DefaultRoot: FnOnce() -> Result<PathBuf>,
{
    executable_path(request)?;
    settings_store(settings_file, default_root).map_err(|err| LaunchError::SettingsLocation {
        message: format!("{err:#}"),
    })
}

fn settings_store<DefaultRoot>(
    settings_file: Option<PathBuf>,
    default_root: DefaultRoot,
) -> Result<SettingsStore>
where
    DefaultRoot: FnOnce() -> Result<PathBuf>,
{
    match settings_file {
        Some(path) => Ok(SettingsStore::new(path)),
        None => Ok(SettingsStore::from_layout(&SettingsLayout::new(
            default_root()?,
        ))),
    }
}

#[cfg(test)]
mod tests;

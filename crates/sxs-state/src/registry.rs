use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use sxs_core::VersionFamily;
use tracing::{debug, trace};

use crate::{StateBackend, StateContainer, StateOpenError};

pub const UNITY_PREFERENCES_KEY: &str = r"HKCU\Software\Unity Technologies";

const REG_BINARY: &str = "REG_BINARY";
const REG_SZ: &str = "REG_SZ";
const REG_EXPAND_SZ: &str = "REG_EXPAND_SZ";
const VALUE_SEPARATOR: &str = "    ";

/// Registry key holding the editor preferences of one major version.
pub fn family_container_path(family: VersionFamily) -> String {
    format!(r"{UNITY_PREFERENCES_KEY}\Unity Editor {}.x", family.major())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_reg_command(args: &[String]) -> Result<RegOutput> {
    let output = Command::new("reg")
        .args(args)
        .output()
        .with_context(|| format!("failed to run reg {}", args.join(" ")))?;
    Ok(RegOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegValue {
    pub(crate) name: String,
    pub(crate) kind: String,
    pub(crate) data: String,
}

impl RegValue {
    fn decoded(&self) -> Result<String> {
        match self.kind.as_str() {
            REG_BINARY => {
                let mut bytes = hex::decode(self.data.trim()).with_context(|| {
                    format!("registry value '{}' holds invalid binary data", self.name)
                })?;
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            _ => Ok(self.data.clone()),
        }
    }
}

pub(crate) fn parse_reg_values(stdout: &str) -> Vec<RegValue> {
    stdout
        .lines()
        .filter(|line| line.starts_with(VALUE_SEPARATOR))
        .filter_map(|line| {
            let mut parts = line.trim_start().splitn(3, VALUE_SEPARATOR);
            let name = parts.next()?.to_string();
            let kind = parts.next()?.trim().to_string();
            if !kind.starts_with("REG_") {
                return None;
            }
            let data = parts.next().unwrap_or_default().trim().to_string();
            Some(RegValue { name, kind, data })
        })
        .collect()
}

fn is_not_found(output: &RegOutput) -> bool {
    output.stderr.to_ascii_lowercase().contains("unable to find")
}

fn is_access_denied(output: &RegOutput) -> bool {
    output.stderr.to_ascii_lowercase().contains("access is denied")
}

fn failure_message(output: &RegOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        "reg exited with a failure status".to_string()
    } else {
        stderr.to_string()
    }
}

/// Editor preferences in the Windows registry, driven through `reg.exe`.
///
/// Limits of going through `reg.exe`:
/// - Missing keys and denied access are told apart by matching the English
///   error text. On a localized Windows both fall through to
///   [`StateOpenError::Failed`]; the launch still aborts, only the distinct
///   log message is lost.
/// - Output is read as UTF-8 while `reg.exe` prints in the console's OEM
///   code page, so non-ASCII `REG_SZ` paths come back garbled.
#[derive(Debug, Clone)]
pub struct RegistryBackend<Exec> {
    executor: Exec,
    host_supported: bool,
}

impl RegistryBackend<fn(&[String]) -> Result<RegOutput>> {
    pub fn system() -> Self {
        Self {
            executor: run_reg_command,
            host_supported: cfg!(windows),
        }
    }
}

impl<Exec> RegistryBackend<Exec>
where
    Exec: FnMut(&[String]) -> Result<RegOutput> + Clone,
{
    pub fn with_executor(executor: Exec) -> Self {
        Self {
            executor,
            host_supported: true,
        }
    }
}

impl<Exec> StateBackend for RegistryBackend<Exec>
where
    Exec: FnMut(&[String]) -> Result<RegOutput> + Clone,
{
    type Container = RegistryContainer<Exec>;

    fn open(
        &mut self,
        family: VersionFamily,
        writable: bool,
    ) -> Result<Self::Container, StateOpenError> {
        let container = family_container_path(family);
        if !self.host_supported {
            return Err(StateOpenError::Failed {
                container,
                message: "the Windows registry is available only on Windows hosts".to_string(),
            });
        }

        let args = vec!["query".to_string(), container.clone()];
        let output = (self.executor)(args.as_slice()).map_err(|err| StateOpenError::Failed {
            container: container.clone(),
            message: format!("{err:#}"),
        })?;
        if !output.success {
            return Err(if is_not_found(&output) {
                StateOpenError::Missing { container }
            } else if is_access_denied(&output) {
                StateOpenError::PermissionDenied {
                    message: failure_message(&output),
                    container,
                }
            } else {
                StateOpenError::Failed {
                    message: failure_message(&output),
                    container,
                }
            });
        }

        debug!(container = %container, writable, "opened registry container");
        Ok(RegistryContainer {
            path: container,
            writable,
            executor: self.executor.clone(),
        })
    }
}

pub struct RegistryContainer<Exec> {
    path: String,
    writable: bool,
    executor: Exec,
}

impl<Exec> std::fmt::Debug for RegistryContainer<Exec> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryContainer")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .finish_non_exhaustive()
    }
}

impl<Exec> RegistryContainer<Exec>
where
    Exec: FnMut(&[String]) -> Result<RegOutput>,
{
    fn run(&mut self, args: &[&str]) -> Result<RegOutput> {
        let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
        trace!(args = ?args, "running reg");
        (self.executor)(args.as_slice())
    }

    fn query_value(&mut self, name: &str) -> Result<Option<RegValue>> {
        let path = self.path.clone();
        let output = self.run(&["query", path.as_str(), "/v", name])?;
        if !output.success {
            if is_not_found(&output) {
                return Ok(None);
            }
            bail!(
                "failed to read registry value '{name}' in {path}: {}",
                failure_message(&output)
            );
        }
        Ok(parse_reg_values(&output.stdout)
            .into_iter()
            .find(|value| value.name == name))
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.writable {
            return Err(anyhow!(
                "registry container {} was opened read-only",
                self.path
            ));
        }
        Ok(())
    }
}

impl<Exec> StateContainer for RegistryContainer<Exec>
where
    Exec: FnMut(&[String]) -> Result<RegOutput>,
{
    fn name(&self) -> &str {
        &self.path
    }

    fn entry_names(&mut self) -> Result<Vec<String>> {
        let path = self.path.clone();
        let output = self.run(&["query", path.as_str()])?;
        if !output.success {
            bail!(
                "failed to list registry values in {path}: {}",
                failure_message(&output)
            );
        }
        Ok(parse_reg_values(&output.stdout)
            .into_iter()
            .map(|value| value.name)
            .collect())
    }

    fn get_entry(&mut self, name: &str) -> Result<Option<String>> {
        self.query_value(name)?
            .map(|value| value.decoded())
            .transpose()
    }

    fn set_entry(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        // Keep the type the editor chose; it writes paths as NUL-terminated binary.
        let existing_kind = self.query_value(name)?.map(|existing| existing.kind);
        let (kind, data) = match existing_kind.as_deref() {
            Some(kind @ (REG_SZ | REG_EXPAND_SZ)) => (kind.to_string(), value.to_string()),
            _ => {
                let mut bytes = value.as_bytes().to_vec();
                bytes.push(0);
                (REG_BINARY.to_string(), hex::encode_upper(bytes))
            }
        };

        let path = self.path.clone();
        let output = self.run(&[
            "add",
            path.as_str(),
            "/v",
            name,
            "/t",
            kind.as_str(),
            "/d",
            data.as_str(),
            "/f",
        ])?;
        if !output.success {
            bail!(
                "failed to write registry value '{name}' in {path}: {}",
                failure_message(&output)
            );
        }
        debug!(container = %path, entry = name, "wrote registry value");
        Ok(())
    }

    fn delete_entry(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        let path = self.path.clone();
        let output = self.run(&["delete", path.as_str(), "/v", name, "/f"])?;
        if !output.success {
            if is_not_found(&output) {
                return Ok(());
            }
            bail!(
                "failed to delete registry value '{name}' in {path}: {}",
                failure_message(&output)
            );
        }
        debug!(container = %path, entry = name, "deleted registry value");
        Ok(())
    }

    fn close(self) -> Result<()> {
        debug!(container = %self.path, "closed registry container");
        Ok(())
    }
}

//! In-memory state backend with the registry's observable behavior, for
//! driving launches in tests. Handles share state, so a test can play the
//! editor's part while a container is open.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};
use sxs_core::VersionFamily;

use crate::{family_container_path, StateBackend, StateContainer, StateOpenError};

#[derive(Debug, Default)]
struct MemoryFamily {
    entries: Vec<(String, String)>,
    denied: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    families: BTreeMap<u64, MemoryFamily>,
    opened: usize,
    closed: usize,
    events: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(self, major: u64, entries: &[(&str, &str)]) -> Self {
        self.state.borrow_mut().families.insert(
            major,
            MemoryFamily {
                entries: entries
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                denied: false,
            },
        );
        self
    }

    pub fn deny_family(self, major: u64) -> Self {
        self.state
            .borrow_mut()
            .families
            .entry(major)
            .or_default()
            .denied = true;
        self
    }

    pub fn entries(&self, major: u64) -> Vec<(String, String)> {
        self.state
            .borrow()
            .families
            .get(&major)
            .map(|family| family.entries.clone())
            .unwrap_or_default()
    }

    pub fn entry(&self, major: u64, name: &str) -> Option<String> {
        self.entries(major)
            .into_iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Writes an entry the way the editor would, outside any container handle.
    pub fn put(&self, major: u64, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        let family = state.families.entry(major).or_default();
        upsert(&mut family.entries, name, value);
    }

    pub fn remove(&self, major: u64, name: &str) {
        if let Some(family) = self.state.borrow_mut().families.get_mut(&major) {
            family.entries.retain(|(existing, _)| existing != name);
        }
    }

    pub fn opened(&self) -> usize {
        self.state.borrow().opened
    }

    pub fn closed(&self) -> usize {
        self.state.borrow().closed
    }

    /// Mutations and lifecycle calls made through container handles, in order.
    pub fn events(&self) -> Vec<String> {
        self.state.borrow().events.clone()
    }
}

fn upsert(entries: &mut Vec<(String, String)>, name: &str, value: &str) {
    match entries.iter_mut().find(|(existing, _)| existing == name) {
        Some((_, slot)) => *slot = value.to_string(),
        None => entries.push((name.to_string(), value.to_string())),
    }
}

impl StateBackend for MemoryBackend {
    type Container = MemoryContainer;

    fn open(
        &mut self,
        family: VersionFamily,
        writable: bool,
    ) -> Result<Self::Container, StateOpenError> {
        let container = family_container_path(family);
        let mut state = self.state.borrow_mut();
        match state.families.get(&family.major()) {
            None => return Err(StateOpenError::Missing { container }),
            Some(existing) if existing.denied => {
                return Err(StateOpenError::PermissionDenied {
                    container,
                    message: "Access is denied.".to_string(),
                })
            }
            Some(_) => {}
        }
        state.opened += 1;
        state.events.push(format!("open {family}"));
        drop(state);

        Ok(MemoryContainer {
            major: family.major(),
            path: container,
            writable,
            state: Rc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MemoryContainer {
    major: u64,
    path: String,
    writable: bool,
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryContainer {
    fn ensure_writable(&self) -> Result<()> {
        if !self.writable {
            bail!("container {} was opened read-only", self.path);
        }
        Ok(())
    }

    fn with_family<T>(&self, action: impl FnOnce(&mut MemoryFamily, &mut Vec<String>) -> T) -> T {
        let mut state = self.state.borrow_mut();
        let MemoryState {
            families, events, ..
        } = &mut *state;
        let family = families.entry(self.major).or_default();
        action(family, events)
    }
}

impl StateContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.path
    }

    fn entry_names(&mut self) -> Result<Vec<String>> {
        Ok(self.with_family(|family, _| {
            family
                .entries
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }))
    }

    fn get_entry(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.with_family(|family, _| {
            family
                .entries
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, value)| value.clone())
        }))
    }

    fn set_entry(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        self.with_family(|family, events| {
            upsert(&mut family.entries, name, value);
            events.push(format!("set {name}={value}"));
        });
        Ok(())
    }

    fn delete_entry(&mut self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        self.with_family(|family, events| {
            family.entries.retain(|(existing, _)| existing != name);
            events.push(format!("delete {name}"));
        });
        Ok(())
    }

    fn close(self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.closed += 1;
        state.events.push("close".to_string());
        Ok(())
    }
}

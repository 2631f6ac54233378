use std::error::Error;
use std::fmt;

use crate::domain::{Module, ModuleEntry};
use crate::gateway::{GatewayError, ModuleGateway};
use crate::ids::now_utc_rfc3339;

#[derive(Debug)]
pub enum ModuleError {
    ModuleNotFound(String),
    EntryNotFound(String),
    /// The entry carries value keys the module schema does not declare.
    UnknownFields(Vec<String>),
    Gateway(GatewayError),
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleError::ModuleNotFound(id) => write!(f, "module '{}' not found", id),
            ModuleError::EntryNotFound(id) => write!(f, "entry '{}' not found", id),
            ModuleError::UnknownFields(keys) => {
                write!(f, "entry carries undeclared fields: {}", keys.join(", "))
            }
            ModuleError::Gateway(err) => write!(f, "persistence failure: {}", err),
        }
    }
}

impl Error for ModuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModuleError::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GatewayError> for ModuleError {
    fn from(value: GatewayError) -> Self {
        ModuleError::Gateway(value)
    }
}

/// Store for user-defined record types and their entries. Entries are
/// validated against the owning module's field schema before anything is
/// touched; an undeclared key rejects the whole write.
pub struct ModuleStore {
    gateway: Box<dyn ModuleGateway>,
    modules: Vec<Module>,
    entries: Vec<ModuleEntry>,
}

impl ModuleStore {
    pub fn new(gateway: Box<dyn ModuleGateway>) -> Self {
        Self {
            gateway,
            modules: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub fn entries_for(&self, module_id: &str) -> Vec<&ModuleEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.module_id == module_id)
            .collect()
    }

    pub fn load(&mut self) -> Result<(), ModuleError> {
        let modules = self.gateway.fetch_modules()?;
        let entries = self.gateway.fetch_entries()?;
        self.modules = modules;
        self.entries = entries;
        Ok(())
    }

    pub fn add_module(&mut self, module: Module) -> Result<(), ModuleError> {
        self.modules.insert(0, module.clone());
        if let Err(err) = self.gateway.upsert_module(&module) {
            self.modules.retain(|existing| existing.id != module.id);
            return Err(err.into());
        }
        Ok(())
    }

    /// Deletes a module and every entry filed under it.
    pub fn delete_module(&mut self, id: &str) -> Result<(), ModuleError> {
        let Some(position) = self.modules.iter().position(|module| module.id == id) else {
            return Ok(());
        };
        let removed = self.modules.remove(position);
        if let Err(err) = self.gateway.delete_module(id) {
            self.modules.insert(position, removed);
            return Err(err.into());
        }
        let orphaned: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.module_id == id)
            .map(|entry| entry.id.clone())
            .collect();
        self.entries.retain(|entry| entry.module_id != id);
        for entry_id in orphaned {
            if let Err(err) = self.gateway.delete_entry(&entry_id) {
                log::warn!("entry '{}' not removed with its module: {}", entry_id, err);
            }
        }
        Ok(())
    }

    pub fn add_entry(&mut self, entry: ModuleEntry) -> Result<(), ModuleError> {
        self.validate(&entry)?;
        self.entries.insert(0, entry.clone());
        if let Err(err) = self.gateway.upsert_entry(&entry) {
            self.entries.retain(|existing| existing.id != entry.id);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn update_entry(&mut self, mut entry: ModuleEntry) -> Result<(), ModuleError> {
        self.validate(&entry)?;
        let Some(position) = self
            .entries
            .iter()
            .position(|existing| existing.id == entry.id)
        else {
            return Err(ModuleError::EntryNotFound(entry.id));
        };
        entry.updated_at = now_utc_rfc3339();
        self.entries[position] = entry.clone();
        if let Err(err) = self.gateway.upsert_entry(&entry) {
            log::error!("entry '{}' update not persisted: {}", entry.id, err);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<(), ModuleError> {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(());
        };
        let removed = self.entries.remove(position);
        if let Err(err) = self.gateway.delete_entry(id) {
            self.entries.insert(position, removed);
            return Err(err.into());
        }
        Ok(())
    }

    fn validate(&self, entry: &ModuleEntry) -> Result<(), ModuleError> {
        let Some(module) = self.module(&entry.module_id) else {
            return Err(ModuleError::ModuleNotFound(entry.module_id.clone()));
        };
        let unknown: Vec<String> = entry
            .values
            .keys()
            .filter(|key| !module.has_field(key))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ModuleError::UnknownFields(unknown))
        }
    }
}

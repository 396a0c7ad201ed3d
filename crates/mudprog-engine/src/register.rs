//! Register variables: a schema of typed fields per entity kind and a
//! sparse store of per-entity overrides.
//!
//! Reading a variable returns the entity's override if present, else the
//! schema default. Writes and resets touch only the override. Adding or
//! removing a schema entry recompiles every prog, since register access is
//! checked at compile time.

use indexmap::IndexMap;
use mudprog_foundation::{ConcreteKind, EntityRef, ProgType, Value};
use tracing::info;

use crate::engine::Engine;
use crate::error::RegisterError;
use crate::prog::{SweepReport, is_identifier};

/// A schema entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterEntry {
    /// Host entity kind
    pub host: ConcreteKind,
    /// Name (lowercase)
    pub name: String,
    /// Declared type
    pub ty: ProgType,
    /// Value read when an entity has no override
    pub default: Value,
}

/// Schema and override store.
#[derive(Debug, Default)]
pub struct Register {
    entries: IndexMap<(ConcreteKind, String), RegisterEntry>,
    values: IndexMap<(EntityRef, String), Value>,
}

impl Register {
    /// Schema entry, if registered.
    pub fn entry(&self, host: ConcreteKind, name: &str) -> Option<&RegisterEntry> {
        self.entries.get(&(host, name.to_lowercase()))
    }

    /// Every schema entry, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &RegisterEntry> {
        self.entries.values()
    }

    /// Every stored override.
    pub fn overrides(&self) -> impl Iterator<Item = (EntityRef, &str, &Value)> {
        self.values
            .iter()
            .map(|((entity, name), value)| (*entity, name.as_str(), value))
    }

    /// Override for an entity, if set.
    pub fn override_value(&self, entity: EntityRef, name: &str) -> Option<&Value> {
        self.values.get(&(entity, name.to_lowercase()))
    }

    fn require(&self, host: ConcreteKind, name: &str) -> Result<&RegisterEntry, RegisterError> {
        self.entry(host, name)
            .ok_or_else(|| RegisterError::UnknownVariable {
                host,
                name: name.to_lowercase(),
            })
    }

    /// Effective value: the override, else the schema default.
    pub fn get(&self, entity: EntityRef, name: &str) -> Result<Value, RegisterError> {
        let entry = self.require(entity.kind, name)?;
        Ok(self
            .override_value(entity, name)
            .unwrap_or(&entry.default)
            .clone())
    }

    pub(crate) fn insert_entry(&mut self, entry: RegisterEntry) -> Result<(), RegisterError> {
        let key = (entry.host, entry.name.clone());
        if self.entries.contains_key(&key) {
            return Err(RegisterError::AlreadyRegistered {
                host: entry.host,
                name: entry.name,
            });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Remove an entry and every override under it. Returns the number of
    /// overrides dropped.
    pub(crate) fn remove_entry(&mut self, host: ConcreteKind, name: &str) -> Result<usize, RegisterError> {
        let name = name.to_lowercase();
        if self.entries.shift_remove(&(host, name.clone())).is_none() {
            return Err(RegisterError::UnknownVariable { host, name });
        }
        let before = self.values.len();
        self.values
            .retain(|(entity, value_name), _| !(entity.kind == host && *value_name == name));
        Ok(before - self.values.len())
    }

    pub(crate) fn set(&mut self, entity: EntityRef, name: &str, value: Value) -> Result<(), RegisterError> {
        let entry = self.require(entity.kind, name)?;
        let value = conform(entry, value)?;
        let key = (entity, entry.name.clone());
        self.values.insert(key, value);
        Ok(())
    }

    pub(crate) fn reset(&mut self, entity: EntityRef, name: &str) -> Result<bool, RegisterError> {
        self.require(entity.kind, name)?;
        Ok(self
            .values
            .shift_remove(&(entity, name.to_lowercase()))
            .is_some())
    }

    fn set_default(&mut self, host: ConcreteKind, name: &str, value: Value) -> Result<(), RegisterError> {
        let entry = self.require(host, name)?;
        let value = conform(entry, value)?;
        if let Some(entry) = self.entries.get_mut(&(host, name.to_lowercase())) {
            entry.default = value;
        }
        Ok(())
    }
}

/// Type-check a value for an entry; nulls take the entry's type.
fn conform(entry: &RegisterEntry, value: Value) -> Result<Value, RegisterError> {
    if value.is_null() {
        return Ok(Value::null(entry.ty));
    }
    if !value.ty().is_assignable_to(entry.ty) {
        return Err(RegisterError::TypeMismatch {
            name: entry.name.clone(),
            expected: entry.ty,
            found: value.ty(),
        });
    }
    Ok(value)
}

/// The single entity kind a host type denotes.
fn host_kind(host: ProgType) -> Result<ConcreteKind, RegisterError> {
    host.concrete_kind()
        .filter(|kind| host.is_single() && kind.is_entity())
        .ok_or(RegisterError::InvalidHost(host))
}

/// Single values whose every possible kind can be persisted.
fn storable(ty: ProgType) -> bool {
    ty.is_single()
        && ty
            .tag
            .members()
            .iter()
            .all(|kind| !kind.is_entity() || kind.has_stable_identity())
}

/// A checked schema entry. A missing default is the type's default.
pub(crate) fn schema_entry(
    host: ProgType,
    name: &str,
    ty: ProgType,
    default: Option<Value>,
) -> Result<RegisterEntry, RegisterError> {
    let kind = host_kind(host)?;
    if !is_identifier(name) {
        return Err(RegisterError::InvalidName(name.to_string()));
    }
    if !storable(ty) {
        return Err(RegisterError::InvalidType(ty));
    }
    let mut entry = RegisterEntry {
        host: kind,
        name: name.to_lowercase(),
        ty,
        default: Value::default_for(ty),
    };
    if let Some(default) = default {
        entry.default = conform(&entry, default)?;
    }
    Ok(entry)
}

impl Engine {
    /// The register schema and store.
    pub fn register(&self) -> &Register {
        &self.register
    }

    /// Add a variable to every entity of `host`, then recompile every prog.
    pub fn register_variable(
        &mut self,
        host: ProgType,
        name: &str,
        ty: ProgType,
    ) -> Result<SweepReport, RegisterError> {
        let entry = schema_entry(host, name, ty, None)?;
        let kind = entry.host;
        self.register.insert_entry(entry)?;
        info!(host = %kind, name, %ty, "register variable added");
        Ok(self.recompile_all())
    }

    /// Remove a variable and every value stored under it, then recompile
    /// every prog. The values are not recoverable.
    pub fn deregister_variable(&mut self, host: ProgType, name: &str) -> Result<SweepReport, RegisterError> {
        let kind = host_kind(host)?;
        let dropped = self.register.remove_entry(kind, name)?;
        info!(host = %kind, name, dropped, "register variable removed");
        Ok(self.recompile_all())
    }

    /// Effective value of a variable on an entity.
    pub fn register_value(&self, entity: EntityRef, name: &str) -> Result<Value, RegisterError> {
        self.register.get(entity, name)
    }

    /// Store an override on a live entity.
    pub fn set_register_value(
        &mut self,
        entity: EntityRef,
        name: &str,
        value: Value,
    ) -> Result<(), RegisterError> {
        if !self.world.exists(entity) {
            return Err(RegisterError::MissingEntity(entity));
        }
        self.register.set(entity, name, value)
    }

    /// Delete an override. Returns false if there was none.
    pub fn reset_register_value(&mut self, entity: EntityRef, name: &str) -> Result<bool, RegisterError> {
        self.register.reset(entity, name)
    }

    /// Change the schema default. Overrides are untouched.
    pub fn set_register_default(
        &mut self,
        host: ProgType,
        name: &str,
        value: Value,
    ) -> Result<(), RegisterError> {
        let kind = host_kind(host)?;
        self.register.set_default(kind, name, value)
    }
}

//! Durable records.
//!
//! The storage collaborator owns the format; the engine only hydrates
//! records and exports them. Progs are recompiled on load, never stored
//! compiled.

use chrono::NaiveDateTime;
use mudprog_foundation::{
    ConcreteKind, DefaultHookId, EntityRef, EventType, HookId, ProgId, ProgSignature, ProgType,
    ScheduleId, Value,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::engine::{Engine, check_accepts, check_eligibility};
use crate::error::{EngineError, HookError, RegisterError, ScheduleError};
use crate::hooks::{DefaultHook, Hook, HookKind};
use crate::interval::RecurringInterval;
use crate::prog::{CompileStatus, Prog, Staticness, SweepReport};
use crate::register::schema_entry;
use crate::schedule::ProgSchedule;

/// A stored prog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgRecord {
    /// Stable id
    pub id: ProgId,
    /// Name
    pub name: String,
    /// Classification
    #[serde(default)]
    pub category: String,
    /// Sub-classification
    #[serde(default)]
    pub subcategory: String,
    /// Edit counter
    #[serde(default = "first_revision")]
    pub revision: u32,
    /// Signature
    pub signature: ProgSignature,
    /// Caching mode
    #[serde(default)]
    pub staticness: Staticness,
    /// Source text
    pub source: String,
}

fn first_revision() -> u32 {
    1
}

/// A stored hook and the entities it is installed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookRecord {
    /// Stable id
    pub id: HookId,
    /// Name
    pub name: String,
    /// Classification
    #[serde(default)]
    pub category: String,
    /// Event answered
    pub event: EventType,
    /// Generic or command-triggered
    pub kind: HookKind,
    /// Payload in attachment order
    pub progs: Vec<ProgId>,
    /// Installations
    #[serde(default)]
    pub targets: Vec<EntityRef>,
}

/// A stored default-hook rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultHookRecord {
    /// Stable id
    pub id: DefaultHookId,
    /// Hook installed
    pub hook: HookId,
    /// Entity kind
    pub kind: ConcreteKind,
    /// Eligibility prog
    pub eligibility: ProgId,
}

/// A stored register schema entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterEntryRecord {
    /// Host kind
    pub host: ConcreteKind,
    /// Name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: ProgType,
    /// Default value
    pub default: Value,
}

/// A stored register override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterValueRecord {
    /// Entity
    pub entity: EntityRef,
    /// Variable name
    pub name: String,
    /// Value
    pub value: Value,
}

/// A stored schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Stable id
    pub id: ScheduleId,
    /// Prog
    pub prog: ProgId,
    /// Interval text, e.g. `every 1 days`
    pub interval: RecurringInterval,
    /// Next due time
    pub next_reference: NaiveDateTime,
}

/// Failure hydrating a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Prog record rejected.
    #[error(transparent)]
    Prog(#[from] EngineError),
    /// Hook or default-hook record rejected.
    #[error(transparent)]
    Hook(#[from] HookError),
    /// Register record rejected.
    #[error(transparent)]
    Register(#[from] RegisterError),
    /// Schedule record rejected.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// Two records share an id.
    #[error("duplicate record id {0}")]
    DuplicateId(String),
}

/// Every durable record of an engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Register schema
    pub registers: Vec<RegisterEntryRecord>,
    /// Register overrides
    pub register_values: Vec<RegisterValueRecord>,
    /// Progs
    pub progs: Vec<ProgRecord>,
    /// Hooks with installations
    pub hooks: Vec<HookRecord>,
    /// Default-hook rules
    pub default_hooks: Vec<DefaultHookRecord>,
    /// Schedules
    pub schedules: Vec<ScheduleRecord>,
}

impl Snapshot {
    /// Parse a snapshot from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Engine {
    /// Hydrate a register schema entry, with the same checks as
    /// [`Engine::register_variable`]. Does not recompile.
    pub fn load_register_entry(&mut self, record: RegisterEntryRecord) -> Result<(), RegisterError> {
        let entry = schema_entry(
            ProgType::concrete(record.host),
            &record.name,
            record.ty,
            Some(record.default),
        )?;
        self.register.insert_entry(entry)
    }

    /// Hydrate a register override. Entity liveness is not checked.
    pub fn load_register_value(&mut self, record: RegisterValueRecord) -> Result<(), RegisterError> {
        self.register.set(record.entity, &record.name, record.value)
    }

    /// Hydrate a prog. It stays uncompiled until [`Engine::recompile_all`].
    pub fn load_prog(&mut self, record: ProgRecord) -> Result<(), LoadError> {
        if self.progs.contains_key(&record.id) {
            return Err(LoadError::DuplicateId(record.id.to_string()));
        }
        self.check_name(&record.name, None)?;
        self.next_prog = self.next_prog.max(record.id.0);
        self.progs.insert(
            record.id,
            Prog {
                id: record.id,
                name: record.name,
                category: record.category,
                subcategory: record.subcategory,
                revision: record.revision,
                signature: record.signature,
                staticness: record.staticness,
                source: record.source,
                status: CompileStatus::Failed(Vec::new()),
            },
        );
        Ok(())
    }

    /// Hydrate a hook and its installations.
    pub fn load_hook(&mut self, record: HookRecord) -> Result<(), LoadError> {
        if self.hooks.hooks.contains_key(&record.id) {
            return Err(LoadError::DuplicateId(record.id.to_string()));
        }
        if self.hook_by_name(&record.name).is_some() {
            return Err(HookError::DuplicateName(record.name).into());
        }
        if matches!(record.kind, HookKind::Command { .. }) && record.event.command_parameter().is_none() {
            return Err(HookError::NotCommandEvent(record.event).into());
        }
        self.check_payload(record.event, &record.progs)?;

        self.hooks.next_hook = self.hooks.next_hook.max(record.id.0);
        for target in &record.targets {
            self.hooks.install(*target, record.id);
        }
        self.hooks.hooks.insert(
            record.id,
            Hook {
                id: record.id,
                name: record.name,
                category: record.category,
                event: record.event,
                kind: record.kind,
                progs: record.progs,
            },
        );
        Ok(())
    }

    /// Hydrate a default-hook rule.
    pub fn load_default_hook(&mut self, record: DefaultHookRecord) -> Result<(), LoadError> {
        if self.hooks.defaults.contains_key(&record.id) {
            return Err(LoadError::DuplicateId(record.id.to_string()));
        }
        self.hooks.get(record.hook)?;
        if !record.kind.is_entity() {
            return Err(HookError::InvalidKind(record.kind).into());
        }
        let prog = self
            .progs
            .get(&record.eligibility)
            .ok_or(HookError::UnknownProg(record.eligibility))?;
        check_eligibility(&prog.name, &prog.signature, record.kind).map_err(HookError::from)?;

        self.hooks.next_default = self.hooks.next_default.max(record.id.0);
        self.hooks.defaults.insert(
            record.id,
            DefaultHook {
                id: record.id,
                hook: record.hook,
                kind: record.kind,
                eligibility: record.eligibility,
            },
        );
        Ok(())
    }

    /// Hydrate a schedule, keeping its stored next reference time.
    pub fn load_schedule(&mut self, record: ScheduleRecord) -> Result<(), LoadError> {
        if self.schedules.contains_key(&record.id) {
            return Err(LoadError::DuplicateId(record.id.to_string()));
        }
        let prog = self
            .progs
            .get(&record.prog)
            .ok_or(ScheduleError::UnknownProg(record.prog))?;
        check_accepts(&prog.name, &prog.signature, &[]).map_err(ScheduleError::from)?;

        self.next_schedule = self.next_schedule.max(record.id.0);
        self.schedules.insert(
            record.id,
            ProgSchedule {
                id: record.id,
                prog: record.prog,
                interval: record.interval,
                next_reference: record.next_reference,
            },
        );
        Ok(())
    }

    /// Hydrate a whole snapshot: register, progs, one recompilation sweep,
    /// then hooks, default hooks and schedules.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<SweepReport, LoadError> {
        for record in snapshot.registers {
            self.load_register_entry(record)?;
        }
        for record in snapshot.register_values {
            self.load_register_value(record)?;
        }
        for record in snapshot.progs {
            self.load_prog(record)?;
        }
        let report = self.recompile_all();
        for record in snapshot.hooks {
            self.load_hook(record)?;
        }
        for record in snapshot.default_hooks {
            self.load_default_hook(record)?;
        }
        for record in snapshot.schedules {
            self.load_schedule(record)?;
        }
        info!(
            progs = self.progs.len(),
            hooks = self.hooks.hooks.len(),
            schedules = self.schedules.len(),
            failing = report.failing_after,
            "snapshot loaded"
        );
        Ok(report)
    }

    /// Prog records.
    pub fn prog_records(&self) -> Vec<ProgRecord> {
        self.progs
            .values()
            .map(|p| ProgRecord {
                id: p.id,
                name: p.name.clone(),
                category: p.category.clone(),
                subcategory: p.subcategory.clone(),
                revision: p.revision,
                signature: p.signature.clone(),
                staticness: p.staticness,
                source: p.source.clone(),
            })
            .collect()
    }

    /// Hook records with their installations.
    pub fn hook_records(&self) -> Vec<HookRecord> {
        self.hooks
            .hooks
            .values()
            .map(|h| HookRecord {
                id: h.id,
                name: h.name.clone(),
                category: h.category.clone(),
                event: h.event,
                kind: h.kind.clone(),
                progs: h.progs.clone(),
                targets: self
                    .hooks
                    .installs
                    .iter()
                    .filter(|(_, installed)| installed.contains(&h.id))
                    .map(|(target, _)| *target)
                    .collect(),
            })
            .collect()
    }

    /// Default-hook records.
    pub fn default_hook_records(&self) -> Vec<DefaultHookRecord> {
        self.hooks
            .defaults
            .values()
            .map(|d| DefaultHookRecord {
                id: d.id,
                hook: d.hook,
                kind: d.kind,
                eligibility: d.eligibility,
            })
            .collect()
    }

    /// Register schema records.
    pub fn register_entry_records(&self) -> Vec<RegisterEntryRecord> {
        self.register
            .entries()
            .map(|e| RegisterEntryRecord {
                host: e.host,
                name: e.name.clone(),
                ty: e.ty,
                default: e.default.clone(),
            })
            .collect()
    }

    /// Register override records.
    pub fn register_value_records(&self) -> Vec<RegisterValueRecord> {
        self.register
            .overrides()
            .map(|(entity, name, value)| RegisterValueRecord {
                entity,
                name: name.to_string(),
                value: value.clone(),
            })
            .collect()
    }

    /// Schedule records.
    pub fn schedule_records(&self) -> Vec<ScheduleRecord> {
        self.schedules
            .values()
            .map(|s| ScheduleRecord {
                id: s.id,
                prog: s.prog,
                interval: s.interval,
                next_reference: s.next_reference,
            })
            .collect()
    }

    /// Every durable record.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: self.register_entry_records(),
            register_values: self.register_value_records(),
            progs: self.prog_records(),
            hooks: self.hook_records(),
            default_hooks: self.default_hook_records(),
            schedules: self.schedule_records(),
        }
    }
}

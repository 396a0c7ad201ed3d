//! Event hooks and default-hook rules.
//!
//! A hook binds an event type to an ordered payload of one or more progs.
//! Hooks are installed on entities; firing an event on an entity runs the
//! payload of every matching installed hook. Every payload prog must accept
//! the event's argument tuple, checked whenever the payload changes.
//!
//! A default hook is a standing rule: when an entity of its kind is
//! materialized, its eligibility prog decides whether the hook is
//! installed. Editing the rule does not touch existing entities; run
//! [`Engine::reconcile_default_hook`] for that.

use indexmap::IndexMap;
use mudprog_foundation::{
    ConcreteKind, DefaultHookId, EntityRef, EventType, HookId, Parameter, ProgId, ProgSignature,
    ReturnType, Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::engine::{Engine, check_accepts, check_eligibility};
use crate::error::{BindError, HookError, RuntimeError};
use crate::interp::{Guard, bind_arguments};

/// How a hook decides it applies to an event occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookKind {
    /// Every occurrence
    Generic,
    /// Occurrences whose `command` argument equals the keyword, ignoring case
    Command {
        /// Command keyword
        keyword: String,
    },
}

/// A hook definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Hook {
    /// Stable id
    pub id: HookId,
    /// Unique name (case-insensitive)
    pub name: String,
    /// Free-form classification
    pub category: String,
    /// Event answered
    pub event: EventType,
    /// Generic or command-triggered
    pub kind: HookKind,
    /// Payload, in attachment order
    pub progs: Vec<ProgId>,
}

impl Hook {
    fn applies_to(&self, args: &[Value]) -> bool {
        match &self.kind {
            HookKind::Generic => true,
            HookKind::Command { keyword } => self
                .event
                .command_parameter()
                .and_then(|i| args.get(i))
                .and_then(Value::as_text)
                .is_some_and(|command| command.trim().eq_ignore_ascii_case(keyword)),
        }
    }
}

/// A rule installing a hook on newly materialized entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultHook {
    /// Stable id
    pub id: DefaultHookId,
    /// Hook to install
    pub hook: HookId,
    /// Entity kind the rule applies to
    pub kind: ConcreteKind,
    /// `(entity) -> Boolean` prog deciding eligibility
    pub eligibility: ProgId,
}

/// Hook definitions, installations and default-hook rules.
#[derive(Debug, Default)]
pub(crate) struct HookTable {
    pub(crate) hooks: IndexMap<HookId, Hook>,
    pub(crate) installs: IndexMap<EntityRef, Vec<HookId>>,
    pub(crate) defaults: IndexMap<DefaultHookId, DefaultHook>,
    pub(crate) next_hook: u64,
    pub(crate) next_default: u64,
}

impl HookTable {
    pub(crate) fn get(&self, id: HookId) -> Result<&Hook, HookError> {
        self.hooks.get(&id).ok_or(HookError::UnknownHook(id))
    }

    fn check_name(&self, name: &str, except: Option<HookId>) -> Result<(), HookError> {
        let taken = self
            .hooks
            .values()
            .any(|h| Some(h.id) != except && h.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(HookError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub(crate) fn install(&mut self, target: EntityRef, hook: HookId) -> bool {
        let installed = self.installs.entry(target).or_default();
        if installed.contains(&hook) {
            return false;
        }
        installed.push(hook);
        true
    }
}

/// Outcome of firing an event on an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FireReport {
    /// Matching hooks run
    pub hooks: usize,
    /// Payload progs that completed
    pub executed: usize,
    /// Payload progs that failed, with their errors
    pub failures: Vec<(ProgId, RuntimeError)>,
}

impl Engine {
    /// Hook by id.
    pub fn hook(&self, id: HookId) -> Option<&Hook> {
        self.hooks.hooks.get(&id)
    }

    /// Hook by name, ignoring case.
    pub fn hook_by_name(&self, name: &str) -> Option<&Hook> {
        self.hooks
            .hooks
            .values()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Every hook, in creation order.
    pub fn hooks(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.hooks.values()
    }

    /// Create a hook answering `event` with a non-empty payload.
    pub fn create_hook(
        &mut self,
        name: &str,
        category: &str,
        event: EventType,
        kind: HookKind,
        progs: &[ProgId],
    ) -> Result<HookId, HookError> {
        self.hooks.check_name(name, None)?;
        if matches!(kind, HookKind::Command { .. }) && event.command_parameter().is_none() {
            return Err(HookError::NotCommandEvent(event));
        }
        let mut payload: Vec<ProgId> = Vec::with_capacity(progs.len());
        for prog in progs {
            if !payload.contains(prog) {
                payload.push(*prog);
            }
        }
        self.check_payload(event, &payload)?;
        self.hooks.next_hook += 1;
        let id = HookId(self.hooks.next_hook);
        self.hooks.hooks.insert(
            id,
            Hook {
                id,
                name: name.to_string(),
                category: category.to_string(),
                event,
                kind,
                progs: payload,
            },
        );
        debug!(%id, name, %event, "hook created");
        Ok(id)
    }

    /// Rename a hook.
    pub fn rename_hook(&mut self, id: HookId, name: &str) -> Result<(), HookError> {
        self.hooks.get(id)?;
        self.hooks.check_name(name, Some(id))?;
        if let Some(hook) = self.hooks.hooks.get_mut(&id) {
            hook.name = name.to_string();
        }
        Ok(())
    }

    /// Delete a hook, uninstall it everywhere and drop its default-hook
    /// rules. Returns the number of entities it was installed on.
    pub fn delete_hook(&mut self, id: HookId) -> Result<usize, HookError> {
        self.hooks.get(id)?;
        let mut uninstalled = 0;
        for installed in self.hooks.installs.values_mut() {
            let before = installed.len();
            installed.retain(|h| *h != id);
            uninstalled += before - installed.len();
        }
        self.hooks.installs.retain(|_, installed| !installed.is_empty());
        self.hooks.defaults.retain(|_, rule| rule.hook != id);
        self.hooks.hooks.shift_remove(&id);
        info!(%id, uninstalled, "hook deleted");
        Ok(uninstalled)
    }

    /// Attach a prog to a hook's payload.
    ///
    /// The resulting payload must accept the event's arguments; on failure
    /// the payload is unchanged. Returns false if the prog was already
    /// attached.
    pub fn add_hook_prog(&mut self, hook: HookId, prog: ProgId) -> Result<bool, HookError> {
        let current = self.hooks.get(hook)?;
        if current.progs.contains(&prog) {
            return Ok(false);
        }
        let mut payload = current.progs.clone();
        payload.push(prog);
        self.check_payload(current.event, &payload)?;
        if let Some(hook) = self.hooks.hooks.get_mut(&hook) {
            hook.progs = payload;
        }
        Ok(true)
    }

    /// Detach a prog from a hook's payload. The last prog cannot be
    /// detached; delete the hook instead.
    pub fn remove_hook_prog(&mut self, hook: HookId, prog: ProgId) -> Result<(), HookError> {
        let current = self.hooks.get(hook)?;
        if !current.progs.contains(&prog) {
            return Err(HookError::NotAttached { hook, prog });
        }
        let payload: Vec<ProgId> = current.progs.iter().copied().filter(|p| *p != prog).collect();
        self.check_payload(current.event, &payload)?;
        if let Some(hook) = self.hooks.hooks.get_mut(&hook) {
            hook.progs = payload;
        }
        Ok(())
    }

    pub(crate) fn check_payload(&self, event: EventType, payload: &[ProgId]) -> Result<(), HookError> {
        if payload.is_empty() {
            return Err(HookError::EmptyPayload);
        }
        let argument_types = event.parameter_types();
        for id in payload {
            let prog = self.progs.get(id).ok_or(HookError::UnknownProg(*id))?;
            check_accepts(&prog.name, &prog.signature, &argument_types)?;
        }
        Ok(())
    }

    /// Install a hook on an entity. Returns false if already installed.
    pub fn install_hook(&mut self, target: EntityRef, hook: HookId) -> Result<bool, HookError> {
        self.hooks.get(hook)?;
        let installed = self.hooks.install(target, hook);
        if installed {
            debug!(%target, %hook, "hook installed");
        }
        Ok(installed)
    }

    /// Uninstall a hook from an entity. Returns false if it was not
    /// installed.
    pub fn uninstall_hook(&mut self, target: EntityRef, hook: HookId) -> Result<bool, HookError> {
        self.hooks.get(hook)?;
        let Some(installed) = self.hooks.installs.get_mut(&target) else {
            return Ok(false);
        };
        let before = installed.len();
        installed.retain(|h| *h != hook);
        let removed = installed.len() != before;
        if installed.is_empty() {
            self.hooks.installs.shift_remove(&target);
        }
        Ok(removed)
    }

    /// Hooks installed on an entity, in installation order.
    pub fn installed_hooks(&self, target: EntityRef) -> Vec<HookId> {
        self.hooks.installs.get(&target).cloned().unwrap_or_default()
    }

    /// Raise an event on an entity.
    ///
    /// The arguments must bind to the event's declared parameters. Every
    /// matching installed hook runs its payload in order. A failing prog is
    /// logged and recorded; its siblings still run.
    #[instrument(skip(self, args), fields(%event, %target))]
    pub fn fire(
        &mut self,
        event: EventType,
        target: EntityRef,
        args: &[Value],
    ) -> Result<FireReport, BindError> {
        let mut guard = Guard::default();
        self.fire_guarded(event, target, args, &mut guard)
    }

    pub(crate) fn fire_guarded(
        &mut self,
        event: EventType,
        target: EntityRef,
        args: &[Value],
        guard: &mut Guard,
    ) -> Result<FireReport, BindError> {
        let args = bind_arguments(&event_signature(event), args)?;
        let args = args.as_slice();
        let matching: Vec<(HookId, Vec<ProgId>)> = self
            .hooks
            .installs
            .get(&target)
            .into_iter()
            .flatten()
            .filter_map(|id| self.hooks.hooks.get(id))
            .filter(|hook| hook.event == event && hook.applies_to(args))
            .map(|hook| (hook.id, hook.progs.clone()))
            .collect();

        let mut report = FireReport {
            hooks: matching.len(),
            ..FireReport::default()
        };
        for (hook, progs) in matching {
            for prog in progs {
                match self.execute_guarded(prog, args, guard) {
                    Ok(_) => report.executed += 1,
                    Err(error) => {
                        warn!(%hook, %prog, %error, "hook prog failed");
                        report.failures.push((prog, error));
                    }
                }
            }
        }
        debug!(
            hooks = report.hooks,
            executed = report.executed,
            failed = report.failures.len(),
            "event fired"
        );
        Ok(report)
    }

    /// Default-hook rule by id.
    pub fn default_hook(&self, id: DefaultHookId) -> Option<&DefaultHook> {
        self.hooks.defaults.get(&id)
    }

    /// Every default-hook rule.
    pub fn default_hooks(&self) -> impl Iterator<Item = &DefaultHook> {
        self.hooks.defaults.values()
    }

    /// Add a default-hook rule for entities of `kind`.
    ///
    /// The eligibility prog must take one argument of that kind and return
    /// Boolean. Existing entities are not affected.
    pub fn add_default_hook(
        &mut self,
        hook: HookId,
        kind: ConcreteKind,
        eligibility: ProgId,
    ) -> Result<DefaultHookId, HookError> {
        self.hooks.get(hook)?;
        if !kind.is_entity() {
            return Err(HookError::InvalidKind(kind));
        }
        let prog = self
            .progs
            .get(&eligibility)
            .ok_or(HookError::UnknownProg(eligibility))?;
        if prog.signature.return_type().value_type() != Some(mudprog_foundation::ProgType::BOOLEAN) {
            return Err(HookError::EligibilityReturnType(prog.name.clone()));
        }
        check_eligibility(&prog.name, &prog.signature, kind)?;

        self.hooks.next_default += 1;
        let id = DefaultHookId(self.hooks.next_default);
        self.hooks.defaults.insert(
            id,
            DefaultHook {
                id,
                hook,
                kind,
                eligibility,
            },
        );
        info!(%id, %hook, %kind, "default hook added");
        Ok(id)
    }

    /// Remove a default-hook rule. Installed hooks stay installed.
    pub fn remove_default_hook(&mut self, id: DefaultHookId) -> Result<DefaultHook, HookError> {
        self.hooks
            .defaults
            .shift_remove(&id)
            .ok_or(HookError::UnknownDefaultHook(id))
    }

    /// Materialization extension point: apply every default-hook rule for
    /// the entity's kind once. Returns the hooks newly installed.
    pub fn materialize(&mut self, entity: EntityRef) -> Vec<HookId> {
        let rules: Vec<DefaultHook> = self
            .hooks
            .defaults
            .values()
            .filter(|rule| rule.kind == entity.kind)
            .cloned()
            .collect();
        rules
            .into_iter()
            .filter(|rule| self.apply_default_hook(rule, entity))
            .map(|rule| rule.hook)
            .collect()
    }

    /// Apply one default-hook rule to existing entities. Entities of other
    /// kinds are skipped. Returns the number of new installations.
    pub fn reconcile_default_hook(
        &mut self,
        id: DefaultHookId,
        candidates: &[EntityRef],
    ) -> Result<usize, HookError> {
        let rule = self
            .hooks
            .defaults
            .get(&id)
            .cloned()
            .ok_or(HookError::UnknownDefaultHook(id))?;
        let installed = candidates
            .iter()
            .filter(|entity| entity.kind == rule.kind)
            .filter(|entity| self.apply_default_hook(&rule, **entity))
            .count();
        info!(%id, candidates = candidates.len(), installed, "default hook reconciled");
        Ok(installed)
    }

    fn apply_default_hook(&mut self, rule: &DefaultHook, entity: EntityRef) -> bool {
        match self.execute(rule.eligibility, &[Value::entity(entity)]) {
            Ok(value) if value.as_bool() == Some(true) => self.hooks.install(entity, rule.hook),
            Ok(_) => false,
            Err(error) => {
                warn!(rule = %rule.id, %entity, %error, "eligibility prog failed");
                false
            }
        }
    }
}

/// The event's parameters as a signature, for binding fired arguments.
fn event_signature(event: EventType) -> ProgSignature {
    ProgSignature::typed(
        ReturnType::Void,
        event
            .parameters()
            .iter()
            .map(|p| Parameter::new(p.name, p.ty))
            .collect(),
    )
}

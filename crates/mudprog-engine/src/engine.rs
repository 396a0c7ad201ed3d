//! The engine value: prog table, compile environment and the services
//! built-ins call back into.
//!
//! Every operation takes the engine explicitly; there is no ambient prog
//! table, hook table or register.

use indexmap::IndexMap;
use mudprog_compiler::{CompileEnvironment, ProgHandle, compile};
use mudprog_foundation::{
    ConcreteKind, EntityRef, ProgId, ProgSignature, ProgType, ReturnType, ScheduleId, Value,
    WorldRegistry,
};
use mudprog_functions::FunctionHost;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, instrument, trace, warn};

use crate::calendar::Calendar;
use crate::config::EngineConfig;
use crate::error::{BindError, EngineError};
use crate::hooks::HookTable;
use crate::prog::{CompileStatus, Prog, ProgDefinition, Staticness, SweepReport, is_identifier};
use crate::register::Register;
use crate::schedule::ProgSchedule;

/// A line of text a prog sent to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipient
    pub target: EntityRef,
    /// Text
    pub message: String,
}

/// The prog engine.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) world: Box<dyn WorldRegistry>,
    pub(crate) calendar: Box<dyn Calendar>,
    pub(crate) progs: IndexMap<ProgId, Prog>,
    pub(crate) static_cache: HashMap<ProgId, Value>,
    pub(crate) hooks: HookTable,
    pub(crate) register: Register,
    pub(crate) schedules: IndexMap<ScheduleId, ProgSchedule>,
    pub(crate) output: Vec<Delivery>,
    pub(crate) next_prog: u64,
    pub(crate) next_schedule: u64,
}

impl Engine {
    /// Create an engine over a world and a calendar.
    pub fn new(
        config: EngineConfig,
        world: Box<dyn WorldRegistry>,
        calendar: Box<dyn Calendar>,
    ) -> Self {
        info!(
            max_call_depth = config.max_call_depth,
            step_budget = config.step_budget,
            "engine created"
        );
        Self {
            config,
            world,
            calendar,
            progs: IndexMap::new(),
            static_cache: HashMap::new(),
            hooks: HookTable::default(),
            register: Register::default(),
            schedules: IndexMap::new(),
            output: Vec::new(),
            next_prog: 0,
            next_schedule: 0,
        }
    }

    /// Active limits.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drain the text progs have sent since the last call.
    pub fn take_output(&mut self) -> Vec<Delivery> {
        std::mem::take(&mut self.output)
    }

    /// Prog by id.
    pub fn prog(&self, id: ProgId) -> Option<&Prog> {
        self.progs.get(&id)
    }

    /// Prog by name, ignoring case.
    pub fn prog_by_name(&self, name: &str) -> Option<&Prog> {
        self.progs
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Every prog, in creation order.
    pub fn progs(&self) -> impl Iterator<Item = &Prog> {
        self.progs.values()
    }

    /// Progs that do not compile.
    pub fn failing_progs(&self) -> impl Iterator<Item = &Prog> {
        self.progs.values().filter(|p| !p.is_executable())
    }

    /// Create and compile a prog.
    ///
    /// A compile failure is not an error here: the prog is stored with its
    /// diagnostics and is not executable until fixed.
    #[instrument(skip(self, definition), fields(name = %definition.name))]
    pub fn create_prog(&mut self, definition: ProgDefinition) -> Result<ProgId, EngineError> {
        self.check_name(&definition.name, None)?;
        self.next_prog += 1;
        let id = ProgId(self.next_prog);
        self.progs.insert(
            id,
            Prog {
                id,
                name: definition.name,
                category: definition.category,
                subcategory: definition.subcategory,
                revision: 1,
                signature: definition.signature,
                staticness: definition.staticness,
                source: definition.source,
                status: CompileStatus::Failed(Vec::new()),
            },
        );
        let compiled = self.compile_prog(id)?;
        debug!(%id, compiled, "prog created");

        // A new name can fix progs that called it before it existed.
        if self.progs.values().any(|p| p.id != id && !p.is_executable()) {
            self.recompile_all();
        }
        Ok(id)
    }

    /// Replace a prog's source and recompile it. Returns true if it compiles.
    pub fn set_source(&mut self, id: ProgId, source: &str) -> Result<bool, EngineError> {
        let prog = self.progs.get_mut(&id).ok_or(EngineError::UnknownProg(id))?;
        prog.source = source.to_string();
        prog.revision += 1;
        self.compile_prog(id)
    }

    /// Replace a prog's signature and recompile every prog.
    ///
    /// Rejected if a hook, default hook or schedule using the prog could no
    /// longer call it.
    pub fn set_signature(
        &mut self,
        id: ProgId,
        signature: ProgSignature,
    ) -> Result<SweepReport, EngineError> {
        let prog = self.progs.get(&id).ok_or(EngineError::UnknownProg(id))?;
        self.check_uses_accept(id, &prog.name, &signature)?;
        if let Some(prog) = self.progs.get_mut(&id) {
            prog.signature = signature;
            prog.revision += 1;
        }
        self.static_cache.remove(&id);
        Ok(self.recompile_all())
    }

    /// Rename a prog and recompile every prog.
    pub fn rename_prog(&mut self, id: ProgId, name: &str) -> Result<SweepReport, EngineError> {
        if !self.progs.contains_key(&id) {
            return Err(EngineError::UnknownProg(id));
        }
        self.check_name(name, Some(id))?;
        self.warn_callers(id, "renaming");
        if let Some(prog) = self.progs.get_mut(&id) {
            prog.name = name.to_string();
        }
        Ok(self.recompile_all())
    }

    /// Change whether the first result is cached.
    pub fn set_staticness(&mut self, id: ProgId, staticness: Staticness) -> Result<(), EngineError> {
        let prog = self.progs.get_mut(&id).ok_or(EngineError::UnknownProg(id))?;
        prog.staticness = staticness;
        self.static_cache.remove(&id);
        Ok(())
    }

    /// Change a prog's classification.
    pub fn set_category(
        &mut self,
        id: ProgId,
        category: &str,
        subcategory: &str,
    ) -> Result<(), EngineError> {
        let prog = self.progs.get_mut(&id).ok_or(EngineError::UnknownProg(id))?;
        prog.category = category.to_string();
        prog.subcategory = subcategory.to_string();
        Ok(())
    }

    /// Delete a prog and recompile every prog.
    ///
    /// A prog still used by a hook, default hook or schedule is kept unless
    /// `force_detach` is set, in which case those uses are removed first and
    /// hooks it was the only prog of are deleted.
    pub fn delete_prog(&mut self, id: ProgId, force_detach: bool) -> Result<SweepReport, EngineError> {
        let prog = self.progs.get(&id).ok_or(EngineError::UnknownProg(id))?;
        let uses = self.prog_uses(id);
        if !uses.is_empty() {
            if !force_detach {
                return Err(EngineError::ProgInUse {
                    prog: prog.name.clone(),
                    uses,
                });
            }
            self.detach_prog(id);
        }
        self.warn_callers(id, "deleting");
        self.progs.shift_remove(&id);
        self.static_cache.remove(&id);
        info!(%id, "prog deleted");
        Ok(self.recompile_all())
    }

    /// Recompile one prog against the current environment. Returns true if
    /// it compiles.
    pub fn compile_prog(&mut self, id: ProgId) -> Result<bool, EngineError> {
        let prog = self.progs.get(&id).ok_or(EngineError::UnknownProg(id))?;
        let status = self.compile_status(prog);
        let compiled = status.is_compiled();
        if let Some(prog) = self.progs.get_mut(&id) {
            prog.status = status;
        }
        self.static_cache.remove(&id);
        Ok(compiled)
    }

    /// Recompile every prog.
    ///
    /// Runs as one exclusive pass: the environment is read once per prog
    /// and nothing executes until the pass completes.
    #[instrument(skip(self))]
    pub fn recompile_all(&mut self) -> SweepReport {
        let failing_before = self.failing_progs().count();
        let statuses: Vec<(ProgId, CompileStatus)> = self
            .progs
            .values()
            .map(|p| (p.id, self.compile_status(p)))
            .collect();
        for (id, status) in statuses {
            if let Some(prog) = self.progs.get_mut(&id)
                && prog.status != status
            {
                prog.status = status;
                self.static_cache.remove(&id);
            }
        }

        let report = SweepReport {
            total: self.progs.len(),
            failing_before,
            failing_after: self.failing_progs().count(),
        };
        info!(
            total = report.total,
            failing_before = report.failing_before,
            failing_after = report.failing_after,
            "recompilation sweep"
        );
        report
    }

    fn compile_status(&self, prog: &Prog) -> CompileStatus {
        let env = EngineEnvironment {
            progs: &self.progs,
            register: &self.register,
        };
        match compile(&prog.source, &prog.signature, &env) {
            Ok(compiled) => CompileStatus::Compiled(Rc::new(compiled)),
            Err(errors) => CompileStatus::Failed(errors),
        }
    }

    pub(crate) fn check_name(&self, name: &str, except: Option<ProgId>) -> Result<(), EngineError> {
        if !is_identifier(name) {
            return Err(EngineError::InvalidName(name.to_string()));
        }
        let taken = self
            .progs
            .values()
            .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Compiled progs that call `id` directly.
    pub fn prog_callers(&self, id: ProgId) -> Vec<ProgId> {
        self.progs
            .values()
            .filter(|p| p.id != id)
            .filter(|p| p.compiled().is_some_and(|c| c.called_progs().contains(&id)))
            .map(|p| p.id)
            .collect()
    }

    fn warn_callers(&self, id: ProgId, action: &str) {
        let callers = self.prog_callers(id);
        if !callers.is_empty() {
            warn!(%id, callers = callers.len(), "{} a prog other progs call", action);
        }
    }

    /// Human-readable list of the records that use a prog.
    pub fn prog_uses(&self, id: ProgId) -> Vec<String> {
        let mut uses = Vec::new();
        for hook in self.hooks.hooks.values() {
            if hook.progs.contains(&id) {
                uses.push(format!("hook '{}'", hook.name));
            }
        }
        for rule in self.hooks.defaults.values() {
            if rule.eligibility == id {
                uses.push(rule.id.to_string());
            }
        }
        for schedule in self.schedules.values() {
            if schedule.prog == id {
                uses.push(schedule.id.to_string());
            }
        }
        uses
    }

    /// Remove every use of a prog. A hook left without progs is deleted.
    fn detach_prog(&mut self, id: ProgId) {
        let mut emptied = Vec::new();
        for hook in self.hooks.hooks.values_mut() {
            hook.progs.retain(|p| *p != id);
            if hook.progs.is_empty() {
                emptied.push(hook.id);
            }
        }
        for hook in emptied {
            if self.delete_hook(hook).is_ok() {
                debug!(%hook, "hook deleted with its last prog");
            }
        }
        self.hooks.defaults.retain(|_, rule| rule.eligibility != id);
        self.schedules.retain(|_, schedule| schedule.prog != id);
        debug!(%id, "prog detached from hooks and schedules");
    }

    fn check_uses_accept(
        &self,
        id: ProgId,
        name: &str,
        signature: &ProgSignature,
    ) -> Result<(), BindError> {
        for hook in self.hooks.hooks.values().filter(|h| h.progs.contains(&id)) {
            check_accepts(name, signature, &hook.event.parameter_types())?;
        }
        for rule in self.hooks.defaults.values().filter(|r| r.eligibility == id) {
            check_eligibility(name, signature, rule.kind)?;
        }
        if self.schedules.values().any(|s| s.prog == id) {
            check_accepts(name, signature, &[])?;
        }
        Ok(())
    }
}

/// Fail unless a prog with `signature` binds `argument_types`.
pub(crate) fn check_accepts(
    name: &str,
    signature: &ProgSignature,
    argument_types: &[ProgType],
) -> Result<(), BindError> {
    if signature.accepts(argument_types) {
        return Ok(());
    }
    Err(BindError::IncompatibleSignature {
        prog: name.to_string(),
        signature: signature.to_string(),
        required: describe_tuple(argument_types),
    })
}

/// Fail unless a prog can decide default-hook eligibility for `kind`.
pub(crate) fn check_eligibility(
    name: &str,
    signature: &ProgSignature,
    kind: ConcreteKind,
) -> Result<(), BindError> {
    let argument = [ProgType::concrete(kind)];
    if signature.accepts(&argument) && signature.return_type() == ReturnType::Value(ProgType::BOOLEAN) {
        return Ok(());
    }
    Err(BindError::IncompatibleSignature {
        prog: name.to_string(),
        signature: signature.to_string(),
        required: format!("{} -> Boolean", describe_tuple(&argument)),
    })
}

fn describe_tuple(types: &[ProgType]) -> String {
    let parts: Vec<String> = types.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

/// Compile-time view of the engine's progs and register schema.
struct EngineEnvironment<'a> {
    progs: &'a IndexMap<ProgId, Prog>,
    register: &'a Register,
}

impl CompileEnvironment for EngineEnvironment<'_> {
    fn register_type(&self, host: ConcreteKind, name: &str) -> Option<ProgType> {
        self.register.entry(host, name).map(|entry| entry.ty)
    }

    fn prog(&self, name: &str) -> Option<ProgHandle> {
        self.progs
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| ProgHandle {
                id: p.id,
                signature: p.signature.clone(),
            })
    }
}

impl FunctionHost for Engine {
    fn world(&self) -> &dyn WorldRegistry {
        self.world.as_ref()
    }

    fn now(&self) -> chrono::NaiveDateTime {
        self.calendar.now()
    }

    fn send(&mut self, target: EntityRef, message: &str) {
        trace!(%target, message, "prog output");
        self.output.push(Delivery {
            target,
            message: message.to_string(),
        });
    }

    fn max_collection_size(&self) -> usize {
        self.config.max_collection_size
    }
}

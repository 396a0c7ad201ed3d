//! Prog records and their compile state.

use mudprog_ast::CompiledProg;
use mudprog_compiler::CompileError;
use mudprog_foundation::{ProgId, ProgSignature};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Whether a prog's first result is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Staticness {
    /// Evaluate the body on every call
    #[default]
    NotStatic,
    /// Evaluate once, return the cached value afterwards
    FullyStatic,
}

/// Outcome of the last compilation.
///
/// A prog is executable exactly when it is `Compiled`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileStatus {
    /// Checked executable form
    Compiled(Rc<CompiledProg>),
    /// Diagnostics, at least one of them an error
    Failed(Vec<CompileError>),
}

impl CompileStatus {
    /// True if the prog can be executed.
    pub fn is_compiled(&self) -> bool {
        matches!(self, CompileStatus::Compiled(_))
    }

    /// Diagnostics, empty when compiled.
    pub fn errors(&self) -> &[CompileError] {
        match self {
            CompileStatus::Compiled(_) => &[],
            CompileStatus::Failed(errors) => errors,
        }
    }
}

/// A stored prog.
#[derive(Debug, Clone, PartialEq)]
pub struct Prog {
    /// Stable id
    pub id: ProgId,
    /// Unique name (case-insensitive)
    pub name: String,
    /// Free-form classification
    pub category: String,
    /// Free-form sub-classification
    pub subcategory: String,
    /// Bumped on every source or signature edit
    pub revision: u32,
    /// Return type and parameters
    pub signature: ProgSignature,
    /// Caching mode
    pub staticness: Staticness,
    /// Source text
    pub source: String,
    /// Result of the last compilation
    pub status: CompileStatus,
}

impl Prog {
    /// True if the prog compiled cleanly.
    pub fn is_executable(&self) -> bool {
        self.status.is_compiled()
    }

    /// Compiled form, if any.
    pub fn compiled(&self) -> Option<&Rc<CompiledProg>> {
        match &self.status {
            CompileStatus::Compiled(compiled) => Some(compiled),
            CompileStatus::Failed(_) => None,
        }
    }
}

/// Everything needed to create a prog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgDefinition {
    /// Name
    pub name: String,
    /// Classification
    pub category: String,
    /// Sub-classification
    pub subcategory: String,
    /// Signature
    pub signature: ProgSignature,
    /// Caching mode
    pub staticness: Staticness,
    /// Source text
    pub source: String,
}

impl ProgDefinition {
    /// A non-static, uncategorized prog.
    pub fn new(name: impl Into<String>, signature: ProgSignature, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            subcategory: String::new(),
            signature,
            staticness: Staticness::NotStatic,
            source: source.into(),
        }
    }

    /// Set the category and subcategory.
    pub fn with_category(mut self, category: &str, subcategory: &str) -> Self {
        self.category = category.to_string();
        self.subcategory = subcategory.to_string();
        self
    }

    /// Cache the first result.
    pub fn fully_static(mut self) -> Self {
        self.staticness = Staticness::FullyStatic;
        self
    }
}

/// Before/after counts of a recompilation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Progs recompiled
    pub total: usize,
    /// Progs failing before the sweep
    pub failing_before: usize,
    /// Progs failing after the sweep
    pub failing_after: usize,
}

impl SweepReport {
    /// Net number of progs that stopped compiling.
    pub fn newly_failing(&self) -> usize {
        self.failing_after.saturating_sub(self.failing_before)
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} progs now fail to compile (was {})",
            self.failing_after, self.total, self.failing_before
        )
    }
}

/// True if `name` is an identifier: a letter or `_`, then letters, digits
/// or `_`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_report_display() {
        let report = SweepReport {
            total: 10,
            failing_before: 1,
            failing_after: 3,
        };
        assert_eq!(report.newly_failing(), 2);
        assert_eq!(report.to_string(), "3 of 10 progs now fail to compile (was 1)");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("greet_player2"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier(""));
    }
}

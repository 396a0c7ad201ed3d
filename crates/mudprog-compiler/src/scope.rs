//! Lexical scopes and frame slot allocation.
//!
//! Every binding gets a fresh slot; slots are never reused, so the frame
//! size is simply the number of bindings ever made.

use indexmap::IndexMap;
use mudprog_ast::Slot;
use mudprog_foundation::ProgType;

/// A resolved local binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local {
    /// Frame slot
    pub slot: Slot,
    /// Declared type
    pub ty: ProgType,
}

/// Stack of nested scopes.
#[derive(Debug, Default)]
pub struct Scopes {
    frames: Vec<IndexMap<String, Local>>,
    next_slot: Slot,
}

impl Scopes {
    /// A stack with one (outermost) scope.
    pub fn new() -> Self {
        Self {
            frames: vec![IndexMap::new()],
            next_slot: 0,
        }
    }

    /// Enter a nested scope.
    pub fn push(&mut self) {
        self.frames.push(IndexMap::new());
    }

    /// Leave the innermost scope.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind `name` in the innermost scope.
    ///
    /// Returns `None` if the innermost scope already binds `name`.
    pub fn declare(&mut self, name: &str, ty: ProgType) -> Option<Local> {
        let frame = self.frames.last_mut()?;
        if frame.contains_key(name) {
            return None;
        }
        let local = Local {
            slot: self.next_slot,
            ty,
        };
        self.next_slot += 1;
        frame.insert(name.to_string(), local);
        Some(local)
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<Local> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    /// Names visible from the innermost scope, nearest first.
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.keys().map(String::as_str))
    }

    /// Number of slots allocated so far.
    pub fn slot_count(&self) -> usize {
        self.next_slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_gets_fresh_slot() {
        let mut scopes = Scopes::new();
        let outer = scopes.declare("x", ProgType::NUMBER).unwrap();
        scopes.push();
        let inner = scopes.declare("x", ProgType::TEXT).unwrap();
        assert_ne!(outer.slot, inner.slot);
        assert_eq!(scopes.lookup("x").unwrap().ty, ProgType::TEXT);
        scopes.pop();
        assert_eq!(scopes.lookup("x").unwrap().ty, ProgType::NUMBER);
        assert_eq!(scopes.slot_count(), 2);
    }

    #[test]
    fn test_duplicate_in_same_scope_rejected() {
        let mut scopes = Scopes::new();
        assert!(scopes.declare("x", ProgType::NUMBER).is_some());
        assert!(scopes.declare("x", ProgType::NUMBER).is_none());
    }
}

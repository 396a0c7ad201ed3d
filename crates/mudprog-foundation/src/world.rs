//! The world registry seam.
//!
//! The engine never owns world entities. It resolves operator text into
//! entity references, checks that references are still live, and asks for
//! a few display facts, all through this trait.

use crate::types::ConcreteKind;
use crate::value::{EntityRef, Gender};

/// Read-only view of the world used for coercion and world built-ins.
pub trait WorldRegistry {
    /// Resolve a key (numeric id or name) to an entity of `kind`.
    fn lookup(&self, kind: ConcreteKind, key: &str) -> Option<EntityRef>;

    /// True if the entity still exists.
    fn exists(&self, entity: EntityRef) -> bool;

    /// Display name of a live entity.
    fn name(&self, entity: EntityRef) -> Option<String>;

    /// Grammatical gender, for entities that have one.
    fn gender(&self, _entity: EntityRef) -> Option<Gender> {
        None
    }

    /// Location currently containing the entity.
    fn location_of(&self, _entity: EntityRef) -> Option<EntityRef> {
        None
    }
}

//! In-memory world registry.
//!
//! A cheap cloneable handle over shared state: the engine owns one clone,
//! the caller keeps another to add, move and remove entities while the
//! engine is running.

use indexmap::IndexMap;
use mudprog_foundation::{ConcreteKind, EntityRef, Gender, WorldRegistry};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    gender: Option<Gender>,
    location: Option<EntityRef>,
}

#[derive(Debug, Default)]
struct State {
    entities: IndexMap<EntityRef, Entity>,
    next_id: u64,
}

/// Shared in-memory world.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    state: Rc<RefCell<State>>,
}

impl MemoryWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity and return its reference.
    pub fn add(&self, kind: ConcreteKind, name: &str) -> EntityRef {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let entity = EntityRef::new(kind, state.next_id);
        state.entities.insert(
            entity,
            Entity {
                name: name.to_string(),
                gender: None,
                location: None,
            },
        );
        entity
    }

    /// Set an entity's gender.
    pub fn set_gender(&self, entity: EntityRef, gender: Gender) {
        if let Some(e) = self.state.borrow_mut().entities.get_mut(&entity) {
            e.gender = Some(gender);
        }
    }

    /// Place an entity in a location.
    pub fn set_location(&self, entity: EntityRef, location: EntityRef) {
        if let Some(e) = self.state.borrow_mut().entities.get_mut(&entity) {
            e.location = Some(location);
        }
    }

    /// Delete an entity.
    pub fn remove(&self, entity: EntityRef) -> bool {
        self.state.borrow_mut().entities.shift_remove(&entity).is_some()
    }

    /// Every live entity of `kind`, in creation order.
    pub fn all_of(&self, kind: ConcreteKind) -> Vec<EntityRef> {
        self.state
            .borrow()
            .entities
            .keys()
            .filter(|e| e.kind == kind)
            .copied()
            .collect()
    }
}

impl WorldRegistry for MemoryWorld {
    /// Keys are `#12`, `12` or a case-insensitive name.
    fn lookup(&self, kind: ConcreteKind, key: &str) -> Option<EntityRef> {
        let key = key.trim();
        let state = self.state.borrow();
        if let Ok(id) = key.trim_start_matches('#').parse::<u64>() {
            let entity = EntityRef::new(kind, id);
            return state.entities.contains_key(&entity).then_some(entity);
        }
        state
            .entities
            .iter()
            .find(|(e, info)| e.kind == kind && info.name.eq_ignore_ascii_case(key))
            .map(|(e, _)| *e)
    }

    fn exists(&self, entity: EntityRef) -> bool {
        self.state.borrow().entities.contains_key(&entity)
    }

    fn name(&self, entity: EntityRef) -> Option<String> {
        self.state
            .borrow()
            .entities
            .get(&entity)
            .map(|e| e.name.clone())
    }

    fn gender(&self, entity: EntityRef) -> Option<Gender> {
        self.state.borrow().entities.get(&entity).and_then(|e| e.gender)
    }

    fn location_of(&self, entity: EntityRef) -> Option<EntityRef> {
        self.state
            .borrow()
            .entities
            .get(&entity)
            .and_then(|e| e.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id_and_name() {
        let world = MemoryWorld::new();
        let bob = world.add(ConcreteKind::Character, "Bob");
        assert_eq!(world.lookup(ConcreteKind::Character, "bob"), Some(bob));
        assert_eq!(
            world.lookup(ConcreteKind::Character, &format!("#{}", bob.id)),
            Some(bob)
        );
        assert_eq!(world.lookup(ConcreteKind::Item, "bob"), None);
    }

    #[test]
    fn test_clones_share_state() {
        let world = MemoryWorld::new();
        let handle = world.clone();
        let sword = handle.add(ConcreteKind::Item, "sword");
        assert!(world.exists(sword));
        assert!(handle.remove(sword));
        assert!(!world.exists(sword));
    }
}

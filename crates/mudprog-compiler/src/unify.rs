//! Common types for literal elements.

use mudprog_foundation::{Capability, ConcreteKind, ProgType, TypeTag};

/// Unions tried when literal elements disagree, narrowest first.
const WIDENING_ORDER: [Capability; 5] = [
    Capability::Perceiver,
    Capability::Perceivable,
    Capability::ValueType,
    Capability::ReferenceType,
    Capability::Anything,
];

/// The narrowest type every one of `types` is assignable to.
///
/// Identical types unify to themselves; otherwise the narrowest capability
/// union covering every member kind is chosen. Types with different
/// structures do not unify.
pub fn common_type(types: &[ProgType]) -> Option<ProgType> {
    let first = *types.first()?;
    if types.iter().all(|ty| *ty == first) {
        return Some(first);
    }
    if types.iter().any(|ty| ty.structure != first.structure) {
        return None;
    }
    let kinds: Vec<ConcreteKind> = types
        .iter()
        .flat_map(|ty| ty.tag.members().iter().copied())
        .collect();
    WIDENING_ORDER
        .into_iter()
        .find(|cap| kinds.iter().all(|kind| cap.contains(*kind)))
        .map(|cap| ProgType::new(TypeTag::Union(cap), first.structure))
}

//! Type algebra for the prog language.
//!
//! A prog type is built from three orthogonal parts:
//! - **Tag**: either one concrete kind (`Number`, `Character`, ...) or a
//!   capability union (`Perceivable`, `Anything`, ...)
//! - **Structure**: single value, collection, text-keyed dictionary, or
//!   text-keyed dictionary of collections
//!
//! Unions never describe a stored value; they only appear as declared types
//! to relax compatibility. Compatibility is the one-directional
//! [`is_assignable`] relation, never equality.
//!
//! # Examples
//!
//! ```
//! # use mudprog_foundation::types::*;
//! let chars: ProgType = "Character Collection".parse().unwrap();
//! let perceivables = ProgType::union(Capability::Perceivable).collection();
//!
//! assert!(is_assignable(chars, perceivables));
//! assert!(!is_assignable(perceivables, chars));
//! assert_eq!(chars.to_string(), "Character Collection");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A concrete kind of value.
///
/// Every runtime value carries exactly one concrete kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConcreteKind {
    /// `true` / `false`
    Boolean,
    /// Double precision number
    Number,
    /// Free text
    Text,
    /// Grammatical gender
    Gender,
    /// In-world calendar date and time
    DateTime,
    /// Signed duration
    TimeSpan,
    /// Player or NPC
    Character,
    /// Game item
    Item,
    /// Room / cell
    Location,
    /// Zone containing locations
    Zone,
    /// Shard (world layer)
    Shard,
    /// Exit between two locations
    Exit,
    /// Clan or organisation
    Clan,
    /// Character race
    Race,
    /// Character culture
    Culture,
    /// Currency definition
    Currency,
    /// Transient effect attached to something
    Effect,
}

impl ConcreteKind {
    /// Every concrete kind, in declaration order.
    pub const ALL: [ConcreteKind; 17] = [
        ConcreteKind::Boolean,
        ConcreteKind::Number,
        ConcreteKind::Text,
        ConcreteKind::Gender,
        ConcreteKind::DateTime,
        ConcreteKind::TimeSpan,
        ConcreteKind::Character,
        ConcreteKind::Item,
        ConcreteKind::Location,
        ConcreteKind::Zone,
        ConcreteKind::Shard,
        ConcreteKind::Exit,
        ConcreteKind::Clan,
        ConcreteKind::Race,
        ConcreteKind::Culture,
        ConcreteKind::Currency,
        ConcreteKind::Effect,
    ];

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            ConcreteKind::Boolean => "Boolean",
            ConcreteKind::Number => "Number",
            ConcreteKind::Text => "Text",
            ConcreteKind::Gender => "Gender",
            ConcreteKind::DateTime => "DateTime",
            ConcreteKind::TimeSpan => "TimeSpan",
            ConcreteKind::Character => "Character",
            ConcreteKind::Item => "Item",
            ConcreteKind::Location => "Location",
            ConcreteKind::Zone => "Zone",
            ConcreteKind::Shard => "Shard",
            ConcreteKind::Exit => "Exit",
            ConcreteKind::Clan => "Clan",
            ConcreteKind::Race => "Race",
            ConcreteKind::Culture => "Culture",
            ConcreteKind::Currency => "Currency",
            ConcreteKind::Effect => "Effect",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<ConcreteKind> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// True for kinds that address a world entity (resolved through the
    /// world registry, compared by identity).
    pub fn is_entity(self) -> bool {
        Capability::ReferenceType.contains(self)
    }

    /// True for plain data kinds.
    pub fn is_value_kind(self) -> bool {
        Capability::ValueType.contains(self)
    }

    /// Entity kinds whose identity outlives a single session.
    ///
    /// Effects and exits are rebuilt on load and cannot be safely held in a
    /// persistent register value.
    pub fn has_stable_identity(self) -> bool {
        self.is_entity() && !matches!(self, ConcreteKind::Effect | ConcreteKind::Exit)
    }
}

impl fmt::Display for ConcreteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability union: a named set of concrete kinds.
///
/// Only ever used as a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Every concrete kind
    Anything,
    /// Plain data kinds
    ValueType,
    /// World entity kinds
    ReferenceType,
    /// Things that can be seen
    Perceivable,
    /// Things that can see
    Perceiver,
}

static ALL_KINDS: [ConcreteKind; 17] = ConcreteKind::ALL;

const VALUE_KINDS: &[ConcreteKind] = &[
    ConcreteKind::Boolean,
    ConcreteKind::Number,
    ConcreteKind::Text,
    ConcreteKind::Gender,
    ConcreteKind::DateTime,
    ConcreteKind::TimeSpan,
];

const REFERENCE_KINDS: &[ConcreteKind] = &[
    ConcreteKind::Character,
    ConcreteKind::Item,
    ConcreteKind::Location,
    ConcreteKind::Zone,
    ConcreteKind::Shard,
    ConcreteKind::Exit,
    ConcreteKind::Clan,
    ConcreteKind::Race,
    ConcreteKind::Culture,
    ConcreteKind::Currency,
    ConcreteKind::Effect,
];

const PERCEIVABLE_KINDS: &[ConcreteKind] = &[
    ConcreteKind::Character,
    ConcreteKind::Item,
    ConcreteKind::Location,
    ConcreteKind::Zone,
    ConcreteKind::Shard,
];

const PERCEIVER_KINDS: &[ConcreteKind] = &[ConcreteKind::Character, ConcreteKind::Item];

impl Capability {
    /// Every capability union.
    pub const ALL: [Capability; 5] = [
        Capability::Anything,
        Capability::ValueType,
        Capability::ReferenceType,
        Capability::Perceivable,
        Capability::Perceiver,
    ];

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Anything => "Anything",
            Capability::ValueType => "ValueType",
            Capability::ReferenceType => "ReferenceType",
            Capability::Perceivable => "Perceivable",
            Capability::Perceiver => "Perceiver",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Capability> {
        Self::ALL
            .iter()
            .copied()
            .find(|cap| cap.name().eq_ignore_ascii_case(name))
    }

    /// The member set of this union.
    pub fn members(self) -> &'static [ConcreteKind] {
        match self {
            Capability::Anything => &ALL_KINDS,
            Capability::ValueType => VALUE_KINDS,
            Capability::ReferenceType => REFERENCE_KINDS,
            Capability::Perceivable => PERCEIVABLE_KINDS,
            Capability::Perceiver => PERCEIVER_KINDS,
        }
    }

    /// Set membership test.
    pub fn contains(self, kind: ConcreteKind) -> bool {
        self.members().contains(&kind)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind part of a type: one concrete kind or one union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// A single concrete kind
    Concrete(ConcreteKind),
    /// A capability union
    Union(Capability),
}

impl TypeTag {
    /// Concrete kinds this tag admits.
    pub fn members(self) -> &'static [ConcreteKind] {
        match self {
            TypeTag::Concrete(kind) => {
                let idx = ALL_KINDS.iter().position(|k| *k == kind).unwrap_or_default();
                &ALL_KINDS[idx..idx + 1]
            }
            TypeTag::Union(cap) => cap.members(),
        }
    }

    /// True if every kind admitted by `self` is admitted by `other`.
    pub fn is_subset_of(self, other: TypeTag) -> bool {
        match (self, other) {
            (TypeTag::Concrete(a), TypeTag::Concrete(b)) => a == b,
            (TypeTag::Concrete(a), TypeTag::Union(cap)) => cap.contains(a),
            (TypeTag::Union(a), TypeTag::Union(b)) => {
                a == b || a.members().iter().all(|k| b.contains(*k))
            }
            (TypeTag::Union(_), TypeTag::Concrete(_)) => false,
        }
    }

    /// The concrete kind, if this tag is not a union.
    pub fn concrete(self) -> Option<ConcreteKind> {
        match self {
            TypeTag::Concrete(kind) => Some(kind),
            TypeTag::Union(_) => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TypeTag::Concrete(kind) => kind.name(),
            TypeTag::Union(cap) => cap.name(),
        }
    }
}

/// Structural modifier applied to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Structure {
    /// A single value
    #[default]
    Single,
    /// Ordered list of values
    Collection,
    /// Text-keyed map of values
    Dictionary,
    /// Text-keyed map of collections
    CollectionDictionary,
}

impl Structure {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Structure::Single => None,
            Structure::Collection => Some("Collection"),
            Structure::Dictionary => Some("Dictionary"),
            Structure::CollectionDictionary => Some("CollectionDictionary"),
        }
    }

    fn from_suffix(text: &str) -> Option<Structure> {
        [
            Structure::Collection,
            Structure::Dictionary,
            Structure::CollectionDictionary,
        ]
        .into_iter()
        .find(|s| s.suffix().is_some_and(|name| name.eq_ignore_ascii_case(text)))
    }
}

/// A complete prog type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgType {
    /// Kind part
    pub tag: TypeTag,
    /// Structural modifier
    pub structure: Structure,
}

impl ProgType {
    /// `Boolean`
    pub const BOOLEAN: ProgType = ProgType::concrete(ConcreteKind::Boolean);
    /// `Number`
    pub const NUMBER: ProgType = ProgType::concrete(ConcreteKind::Number);
    /// `Text`
    pub const TEXT: ProgType = ProgType::concrete(ConcreteKind::Text);
    /// `Gender`
    pub const GENDER: ProgType = ProgType::concrete(ConcreteKind::Gender);
    /// `DateTime`
    pub const DATETIME: ProgType = ProgType::concrete(ConcreteKind::DateTime);
    /// `TimeSpan`
    pub const TIMESPAN: ProgType = ProgType::concrete(ConcreteKind::TimeSpan);
    /// `Character`
    pub const CHARACTER: ProgType = ProgType::concrete(ConcreteKind::Character);
    /// `Item`
    pub const ITEM: ProgType = ProgType::concrete(ConcreteKind::Item);
    /// `Location`
    pub const LOCATION: ProgType = ProgType::concrete(ConcreteKind::Location);
    /// `Zone`
    pub const ZONE: ProgType = ProgType::concrete(ConcreteKind::Zone);
    /// `Anything`
    pub const ANYTHING: ProgType = ProgType::union(Capability::Anything);
    /// `Perceivable`
    pub const PERCEIVABLE: ProgType = ProgType::union(Capability::Perceivable);
    /// `ReferenceType`
    pub const REFERENCE: ProgType = ProgType::union(Capability::ReferenceType);
    /// `ValueType`
    pub const VALUE: ProgType = ProgType::union(Capability::ValueType);

    /// Build a type from parts.
    pub const fn new(tag: TypeTag, structure: Structure) -> Self {
        Self { tag, structure }
    }

    /// A single value of a concrete kind.
    pub const fn concrete(kind: ConcreteKind) -> Self {
        Self::new(TypeTag::Concrete(kind), Structure::Single)
    }

    /// A single value of a capability union.
    pub const fn union(cap: Capability) -> Self {
        Self::new(TypeTag::Union(cap), Structure::Single)
    }

    /// Same tag, collection structure.
    pub const fn collection(self) -> Self {
        Self::new(self.tag, Structure::Collection)
    }

    /// Same tag, dictionary structure.
    pub const fn dictionary(self) -> Self {
        Self::new(self.tag, Structure::Dictionary)
    }

    /// Same tag, dictionary-of-collections structure.
    pub const fn collection_dictionary(self) -> Self {
        Self::new(self.tag, Structure::CollectionDictionary)
    }

    /// Same tag with no structural modifier.
    pub const fn element(self) -> Self {
        Self::new(self.tag, Structure::Single)
    }

    /// The concrete kind, if the tag is not a union.
    pub fn concrete_kind(self) -> Option<ConcreteKind> {
        self.tag.concrete()
    }

    /// True for a single value.
    pub fn is_single(self) -> bool {
        self.structure == Structure::Single
    }

    /// True for a collection.
    pub fn is_collection(self) -> bool {
        self.structure == Structure::Collection
    }

    /// True if the tag is a capability union.
    pub fn is_union(self) -> bool {
        matches!(self.tag, TypeTag::Union(_))
    }

    /// True if values of this type are world entities (possibly null).
    pub fn is_reference(self) -> bool {
        self.is_single() && self.tag.is_subset_of(TypeTag::Union(Capability::ReferenceType))
    }

    /// True if `self` may be used where `declared` is expected.
    pub fn is_assignable_to(self, declared: ProgType) -> bool {
        is_assignable(self, declared)
    }
}

/// The single compatibility relation of the type system.
///
/// `actual` is assignable to `declared` iff both share the same structural
/// modifier and every kind admitted by `actual`'s tag is admitted by
/// `declared`'s tag. For a concrete `actual` this is "kinds match, or
/// `declared` is a union containing the kind". Reflexive, not symmetric.
pub fn is_assignable(actual: ProgType, declared: ProgType) -> bool {
    actual.structure == declared.structure && actual.tag.is_subset_of(declared.tag)
}

impl fmt::Display for ProgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.structure.suffix() {
            Some(suffix) => write!(f, "{} {}", self.tag.name(), suffix),
            None => f.write_str(self.tag.name()),
        }
    }
}

/// Error returned when a type name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    /// Empty input
    #[error("empty type name")]
    Empty,
    /// Unknown kind or union name
    #[error("unknown type '{0}'")]
    UnknownKind(String),
    /// Unknown structural suffix
    #[error("unknown type modifier '{0}'")]
    UnknownModifier(String),
    /// More than one modifier
    #[error("too many words in type name '{0}'")]
    TooManyParts(String),
}

impl FromStr for ProgType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let head = parts.next().ok_or(TypeParseError::Empty)?;

        let tag = ConcreteKind::from_name(head)
            .map(TypeTag::Concrete)
            .or_else(|| Capability::from_name(head).map(TypeTag::Union))
            .ok_or_else(|| TypeParseError::UnknownKind(head.to_string()))?;

        let structure = match parts.next() {
            None => Structure::Single,
            Some(suffix) => Structure::from_suffix(suffix)
                .ok_or_else(|| TypeParseError::UnknownModifier(suffix.to_string()))?,
        };

        if parts.next().is_some() {
            return Err(TypeParseError::TooManyParts(s.to_string()));
        }

        Ok(ProgType::new(tag, structure))
    }
}

impl TryFrom<String> for ProgType {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProgType> for String {
    fn from(value: ProgType) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURES: [Structure; 4] = [
        Structure::Single,
        Structure::Collection,
        Structure::Dictionary,
        Structure::CollectionDictionary,
    ];

    #[test]
    fn test_describe_parse_round_trip_for_every_concrete_type() {
        for kind in ConcreteKind::ALL {
            for structure in STRUCTURES {
                let ty = ProgType::new(TypeTag::Concrete(kind), structure);
                let parsed: ProgType = ty.to_string().parse().unwrap();
                assert_eq!(parsed, ty, "round trip failed for {}", ty);
            }
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let ty: ProgType = "character collection".parse().unwrap();
        assert_eq!(ty, ProgType::CHARACTER.collection());
    }

    #[test]
    fn test_parse_rejects_unknown_parts() {
        assert_eq!(
            "Wizard".parse::<ProgType>(),
            Err(TypeParseError::UnknownKind("Wizard".into()))
        );
        assert!(matches!(
            "Number Stack".parse::<ProgType>(),
            Err(TypeParseError::UnknownModifier(_))
        ));
        assert!(matches!(
            "Number Collection Extra".parse::<ProgType>(),
            Err(TypeParseError::TooManyParts(_))
        ));
        assert_eq!("   ".parse::<ProgType>(), Err(TypeParseError::Empty));
    }

    #[test]
    fn test_assignable_is_reflexive() {
        for kind in ConcreteKind::ALL {
            for structure in STRUCTURES {
                let ty = ProgType::new(TypeTag::Concrete(kind), structure);
                assert!(is_assignable(ty, ty));
            }
        }
        for cap in Capability::ALL {
            let ty = ProgType::union(cap);
            assert!(is_assignable(ty, ty));
        }
    }

    #[test]
    fn test_union_accepts_members_but_not_vice_versa() {
        assert!(is_assignable(ProgType::CHARACTER, ProgType::PERCEIVABLE));
        assert!(!is_assignable(ProgType::PERCEIVABLE, ProgType::CHARACTER));
        assert!(!is_assignable(ProgType::NUMBER, ProgType::PERCEIVABLE));
        assert!(is_assignable(ProgType::NUMBER, ProgType::ANYTHING));
    }

    #[test]
    fn test_structure_must_match() {
        assert!(!is_assignable(ProgType::CHARACTER.collection(), ProgType::CHARACTER));
        assert!(!is_assignable(ProgType::CHARACTER, ProgType::ANYTHING.collection()));
        assert!(is_assignable(
            ProgType::CHARACTER.collection(),
            ProgType::ANYTHING.collection()
        ));
    }

    #[test]
    fn test_union_subset() {
        let perceiver = ProgType::union(Capability::Perceiver);
        assert!(is_assignable(perceiver, ProgType::PERCEIVABLE));
        assert!(!is_assignable(ProgType::PERCEIVABLE, perceiver));
        assert!(is_assignable(ProgType::PERCEIVABLE, ProgType::ANYTHING));
    }

    #[test]
    fn test_concrete_and_union_never_equal() {
        for kind in ConcreteKind::ALL {
            for cap in Capability::ALL {
                assert_ne!(ProgType::concrete(kind), ProgType::union(cap));
            }
        }
    }

    #[test]
    fn test_serde_uses_type_names() {
        let yaml = serde_yaml::to_string(&ProgType::ITEM.dictionary()).unwrap();
        assert_eq!(yaml.trim(), "Item Dictionary");
        let back: ProgType = serde_yaml::from_str("Perceivable Collection").unwrap();
        assert_eq!(back, ProgType::PERCEIVABLE.collection());
    }
}

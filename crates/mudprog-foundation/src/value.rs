//! Runtime values.
//!
//! A [`Value`] is a `(type, payload)` pair. The type of a single value is
//! always concrete; a container's type records the element type it was
//! declared with, which may be a union when the elements are mixed.

use chrono::{NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ConcreteKind, ProgType, Structure, TypeTag};

/// Grammatical gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    /// he / him
    Male,
    /// she / her
    Female,
    /// it
    Neuter,
    /// they / them
    NonBinary,
    /// they / them
    Indeterminate,
}

impl Gender {
    /// Every gender.
    pub const ALL: [Gender; 5] = [
        Gender::Male,
        Gender::Female,
        Gender::Neuter,
        Gender::NonBinary,
        Gender::Indeterminate,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Neuter => "neuter",
            Gender::NonBinary => "non-binary",
            Gender::Indeterminate => "indeterminate",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Gender> {
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.name().eq_ignore_ascii_case(name))
    }

    /// Subjective pronoun.
    pub fn subjective(self) -> &'static str {
        match self {
            Gender::Male => "he",
            Gender::Female => "she",
            Gender::Neuter => "it",
            Gender::NonBinary | Gender::Indeterminate => "they",
        }
    }

    /// Objective pronoun.
    pub fn objective(self) -> &'static str {
        match self {
            Gender::Male => "him",
            Gender::Female => "her",
            Gender::Neuter => "it",
            Gender::NonBinary | Gender::Indeterminate => "them",
        }
    }

    /// Possessive pronoun.
    pub fn possessive(self) -> &'static str {
        match self {
            Gender::Male => "his",
            Gender::Female => "her",
            Gender::Neuter => "its",
            Gender::NonBinary | Gender::Indeterminate => "their",
        }
    }
}

/// Reference to a world entity: its kind and stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity kind (always an entity kind)
    pub kind: ConcreteKind,
    /// Stable id within that kind
    pub id: u64,
}

impl EntityRef {
    /// Create a new entity reference.
    pub fn new(kind: ConcreteKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

/// Payload of a runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Data {
    /// Absent reference
    Null,
    /// Boolean payload
    Boolean(bool),
    /// Numeric payload
    Number(f64),
    /// Text payload
    Text(String),
    /// Gender payload
    Gender(Gender),
    /// Calendar time payload
    DateTime(NaiveDateTime),
    /// Duration payload
    TimeSpan(#[serde(with = "timespan_millis")] TimeDelta),
    /// Entity id; the kind is carried by the value type
    Entity(u64),
    /// Ordered elements
    Collection(Vec<Value>),
    /// Text-keyed elements, in insertion order
    Dictionary(IndexMap<String, Value>),
    /// Text-keyed collections, in insertion order
    CollectionDictionary(IndexMap<String, Vec<Value>>),
}

mod timespan_millis {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(TimeDelta::milliseconds(millis))
    }
}

/// A typed runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    ty: ProgType,
    data: Data,
}

impl Value {
    /// Pair a type with a payload.
    ///
    /// Callers are responsible for the payload matching the type; use the
    /// typed constructors where possible.
    pub fn from_parts(ty: ProgType, data: Data) -> Self {
        Self { ty, data }
    }

    /// Boolean value.
    pub fn boolean(value: bool) -> Self {
        Self::from_parts(ProgType::BOOLEAN, Data::Boolean(value))
    }

    /// Number value.
    pub fn number(value: f64) -> Self {
        Self::from_parts(ProgType::NUMBER, Data::Number(value))
    }

    /// Text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::from_parts(ProgType::TEXT, Data::Text(value.into()))
    }

    /// Gender value.
    pub fn gender(value: Gender) -> Self {
        Self::from_parts(ProgType::GENDER, Data::Gender(value))
    }

    /// Calendar time value.
    pub fn datetime(value: NaiveDateTime) -> Self {
        Self::from_parts(ProgType::DATETIME, Data::DateTime(value))
    }

    /// Duration value.
    pub fn timespan(value: TimeDelta) -> Self {
        Self::from_parts(ProgType::TIMESPAN, Data::TimeSpan(value))
    }

    /// Entity reference value.
    pub fn entity(entity: EntityRef) -> Self {
        Self::from_parts(ProgType::concrete(entity.kind), Data::Entity(entity.id))
    }

    /// Null value of the given type.
    pub fn null(ty: ProgType) -> Self {
        Self::from_parts(ty, Data::Null)
    }

    /// Collection value with the given element type.
    pub fn collection(element: ProgType, items: Vec<Value>) -> Self {
        Self::from_parts(element.collection(), Data::Collection(items))
    }

    /// Dictionary value with the given element type.
    pub fn dictionary(element: ProgType, entries: IndexMap<String, Value>) -> Self {
        Self::from_parts(element.dictionary(), Data::Dictionary(entries))
    }

    /// Dictionary-of-collections value with the given element type.
    pub fn collection_dictionary(element: ProgType, entries: IndexMap<String, Vec<Value>>) -> Self {
        Self::from_parts(
            element.collection_dictionary(),
            Data::CollectionDictionary(entries),
        )
    }

    /// The default value of a type.
    ///
    /// Value kinds default to their zero value; entity kinds and unions
    /// default to null; containers default to empty.
    pub fn default_for(ty: ProgType) -> Self {
        let data = match ty.structure {
            Structure::Collection => Data::Collection(Vec::new()),
            Structure::Dictionary => Data::Dictionary(IndexMap::new()),
            Structure::CollectionDictionary => Data::CollectionDictionary(IndexMap::new()),
            Structure::Single => match ty.tag {
                TypeTag::Concrete(ConcreteKind::Boolean) => Data::Boolean(false),
                TypeTag::Concrete(ConcreteKind::Number) => Data::Number(0.0),
                TypeTag::Concrete(ConcreteKind::Text) => Data::Text(String::new()),
                TypeTag::Concrete(ConcreteKind::Gender) => Data::Gender(Gender::Indeterminate),
                TypeTag::Concrete(ConcreteKind::DateTime) => {
                    Data::DateTime(NaiveDateTime::default())
                }
                TypeTag::Concrete(ConcreteKind::TimeSpan) => Data::TimeSpan(TimeDelta::zero()),
                _ => Data::Null,
            },
        };
        Self::from_parts(ty, data)
    }

    /// Runtime type.
    pub fn ty(&self) -> ProgType {
        self.ty
    }

    /// Payload.
    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Consume into the payload.
    pub fn into_data(self) -> Data {
        self.data
    }

    /// True for a null payload.
    pub fn is_null(&self) -> bool {
        matches!(self.data, Data::Null)
    }

    /// Boolean payload.
    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric payload.
    pub fn as_number(&self) -> Option<f64> {
        match self.data {
            Data::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Text payload.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            Data::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Gender payload.
    pub fn as_gender(&self) -> Option<Gender> {
        match self.data {
            Data::Gender(g) => Some(g),
            _ => None,
        }
    }

    /// Calendar time payload.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self.data {
            Data::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Duration payload.
    pub fn as_timespan(&self) -> Option<TimeDelta> {
        match self.data {
            Data::TimeSpan(ts) => Some(ts),
            _ => None,
        }
    }

    /// Entity payload, paired with this value's kind.
    pub fn as_entity(&self) -> Option<EntityRef> {
        match (&self.data, self.ty.concrete_kind()) {
            (Data::Entity(id), Some(kind)) => Some(EntityRef::new(kind, *id)),
            _ => None,
        }
    }

    /// Collection elements.
    pub fn as_collection(&self) -> Option<&[Value]> {
        match &self.data {
            Data::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary entries.
    pub fn as_dictionary(&self) -> Option<&IndexMap<String, Value>> {
        match &self.data {
            Data::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Dictionary-of-collections entries.
    pub fn as_collection_dictionary(&self) -> Option<&IndexMap<String, Vec<Value>>> {
        match &self.data {
            Data::CollectionDictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Mutable payload access for in-place container updates.
    pub fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Data::Null => f.write_str("null"),
            Data::Boolean(b) => write!(f, "{}", b),
            Data::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Data::Text(s) => f.write_str(s),
            Data::Gender(g) => f.write_str(g.name()),
            Data::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Data::TimeSpan(ts) => write!(f, "{}", format_timespan(*ts)),
            Data::Entity(id) => match self.ty.concrete_kind() {
                Some(kind) => write!(f, "{} #{}", kind, id),
                None => write!(f, "#{}", id),
            },
            Data::Collection(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Data::Dictionary(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("\"{}\": {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Data::CollectionDictionary(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, vs)| {
                        let items: Vec<String> = vs.iter().map(ToString::to_string).collect();
                        format!("\"{}\": [{}]", k, items.join(", "))
                    })
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Render a duration in `1d2h3m4s` notation.
pub fn format_timespan(ts: TimeDelta) -> String {
    let negative = ts < TimeDelta::zero();
    let mut secs = ts.num_seconds().abs();
    if secs == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        let count = secs / size;
        if count > 0 {
            out.push_str(&format!("{}{}", count, unit));
            secs -= count * size;
        }
    }
    out
}

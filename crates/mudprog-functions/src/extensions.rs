//! Collection-extension catalogue.
//!
//! An extension is written `collection.op(|x| inner)`. Each operation
//! declares what its inner expression must return and what the whole
//! expression returns; the compiler checks the first and types the call
//! with the second.

use mudprog_foundation::{ProgType, Value};
use std::cmp::Ordering;
use std::fmt;

use crate::FunctionError;
use crate::ordering::compare;

/// Type an extension's inner expression must produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerRequirement {
    /// Boolean predicate
    Boolean,
    /// Number projection
    Number,
    /// Number or Text sort key
    NumberOrText,
    /// Any single (non-container) value
    AnySingle,
}

impl InnerRequirement {
    /// True if an inner expression of type `ty` satisfies this requirement.
    pub fn accepts(self, ty: ProgType) -> bool {
        match self {
            InnerRequirement::Boolean => ty == ProgType::BOOLEAN,
            InnerRequirement::Number => ty == ProgType::NUMBER,
            InnerRequirement::NumberOrText => ty == ProgType::NUMBER || ty == ProgType::TEXT,
            InnerRequirement::AnySingle => ty.is_single(),
        }
    }
}

impl fmt::Display for InnerRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InnerRequirement::Boolean => f.write_str("Boolean"),
            InnerRequirement::Number => f.write_str("Number"),
            InnerRequirement::NumberOrText => f.write_str("Number or Text"),
            InnerRequirement::AnySingle => f.write_str("a single value"),
        }
    }
}

/// A collection-extension operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionOp {
    /// True if any element satisfies the predicate
    Any,
    /// True if every element satisfies the predicate
    All,
    /// True if no element satisfies the predicate
    None,
    /// Number of elements satisfying the predicate
    Count,
    /// Elements satisfying the predicate
    Where,
    /// First element satisfying the predicate, or null
    First,
    /// Last element satisfying the predicate, or null
    Last,
    /// Sum of the projection
    Sum,
    /// Mean of the projection
    Average,
    /// Largest projection
    Max,
    /// Smallest projection
    Min,
    /// Collection of projections
    Select,
    /// Elements sorted ascending by key
    OrderBy,
    /// Elements sorted descending by key
    OrderByDescending,
}

impl ExtensionOp {
    /// Every extension operation.
    pub const ALL: [ExtensionOp; 14] = [
        ExtensionOp::Any,
        ExtensionOp::All,
        ExtensionOp::None,
        ExtensionOp::Count,
        ExtensionOp::Where,
        ExtensionOp::First,
        ExtensionOp::Last,
        ExtensionOp::Sum,
        ExtensionOp::Average,
        ExtensionOp::Max,
        ExtensionOp::Min,
        ExtensionOp::Select,
        ExtensionOp::OrderBy,
        ExtensionOp::OrderByDescending,
    ];

    /// Name in prog source.
    pub fn name(self) -> &'static str {
        match self {
            ExtensionOp::Any => "any",
            ExtensionOp::All => "all",
            ExtensionOp::None => "none",
            ExtensionOp::Count => "count",
            ExtensionOp::Where => "where",
            ExtensionOp::First => "first",
            ExtensionOp::Last => "last",
            ExtensionOp::Sum => "sum",
            ExtensionOp::Average => "average",
            ExtensionOp::Max => "max",
            ExtensionOp::Min => "min",
            ExtensionOp::Select => "select",
            ExtensionOp::OrderBy => "orderby",
            ExtensionOp::OrderByDescending => "orderbydescending",
        }
    }

    /// Lookup by source name.
    pub fn from_name(name: &str) -> Option<ExtensionOp> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// What the inner expression must return.
    pub fn requirement(self) -> InnerRequirement {
        match self {
            ExtensionOp::Any
            | ExtensionOp::All
            | ExtensionOp::None
            | ExtensionOp::Count
            | ExtensionOp::Where
            | ExtensionOp::First
            | ExtensionOp::Last => InnerRequirement::Boolean,
            ExtensionOp::Sum | ExtensionOp::Average | ExtensionOp::Max | ExtensionOp::Min => {
                InnerRequirement::Number
            }
            ExtensionOp::Select => InnerRequirement::AnySingle,
            ExtensionOp::OrderBy | ExtensionOp::OrderByDescending => InnerRequirement::NumberOrText,
        }
    }

    /// Type of the whole expression for a receiver collection type and the
    /// inner expression's type.
    pub fn result_type(self, receiver: ProgType, inner: ProgType) -> ProgType {
        match self {
            ExtensionOp::Any | ExtensionOp::All | ExtensionOp::None => ProgType::BOOLEAN,
            ExtensionOp::Count
            | ExtensionOp::Sum
            | ExtensionOp::Average
            | ExtensionOp::Max
            | ExtensionOp::Min => ProgType::NUMBER,
            ExtensionOp::Where | ExtensionOp::OrderBy | ExtensionOp::OrderByDescending => receiver,
            ExtensionOp::First | ExtensionOp::Last => receiver.element(),
            ExtensionOp::Select => inner.collection(),
        }
    }
}

impl fmt::Display for ExtensionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Combine numeric projections for `sum`, `average`, `max` and `min`.
pub fn reduce_numbers(op: ExtensionOp, numbers: &[f64]) -> Result<f64, FunctionError> {
    let empty = || FunctionError::InvalidArgument {
        function: op.name(),
        message: "collection is empty".to_string(),
    };
    match op {
        ExtensionOp::Sum => Ok(numbers.iter().sum()),
        ExtensionOp::Average if numbers.is_empty() => Err(empty()),
        ExtensionOp::Average => Ok(numbers.iter().sum::<f64>() / numbers.len() as f64),
        ExtensionOp::Max => numbers.iter().copied().reduce(f64::max).ok_or_else(empty),
        ExtensionOp::Min => numbers.iter().copied().reduce(f64::min).ok_or_else(empty),
        other => Err(FunctionError::InvalidArgument {
            function: other.name(),
            message: "not a numeric reduction".to_string(),
        }),
    }
}

/// Stable sort of `(element, key)` pairs by key.
pub fn order_by(mut keyed: Vec<(Value, Value)>, descending: bool) -> Vec<Value> {
    keyed.sort_by(|(_, a), (_, b)| {
        let ord = compare(a, b).unwrap_or(Ordering::Equal);
        if descending { ord.reverse() } else { ord }
    });
    keyed.into_iter().map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for op in ExtensionOp::ALL {
            assert_eq!(ExtensionOp::from_name(op.name()), Some(op));
        }
        assert_eq!(ExtensionOp::from_name("shuffle"), None);
    }

    #[test]
    fn test_sum_requires_number() {
        let req = ExtensionOp::Sum.requirement();
        assert!(req.accepts(ProgType::NUMBER));
        assert!(!req.accepts(ProgType::TEXT));
    }

    #[test]
    fn test_result_types() {
        let chars = ProgType::CHARACTER.collection();
        assert_eq!(ExtensionOp::Where.result_type(chars, ProgType::BOOLEAN), chars);
        assert_eq!(
            ExtensionOp::First.result_type(chars, ProgType::BOOLEAN),
            ProgType::CHARACTER
        );
        assert_eq!(
            ExtensionOp::Select.result_type(chars, ProgType::TEXT),
            ProgType::TEXT.collection()
        );
    }

    #[test]
    fn test_reductions() {
        assert_eq!(reduce_numbers(ExtensionOp::Sum, &[]).unwrap(), 0.0);
        assert_eq!(reduce_numbers(ExtensionOp::Average, &[2.0, 4.0]).unwrap(), 3.0);
        assert_eq!(reduce_numbers(ExtensionOp::Max, &[2.0, 9.0, 4.0]).unwrap(), 9.0);
        assert!(reduce_numbers(ExtensionOp::Min, &[]).is_err());
    }

    #[test]
    fn test_order_by_is_stable() {
        let keyed = vec![
            (Value::text("b"), Value::number(1.0)),
            (Value::text("a"), Value::number(0.0)),
            (Value::text("c"), Value::number(1.0)),
        ];
        let sorted = order_by(keyed, false);
        let names: Vec<String> = sorted.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}

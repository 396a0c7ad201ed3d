// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Built-in function catalogue.
//!
//! Built-ins register themselves into [`BUILTINS`] with
//! [`linkme::distributed_slice`], grouped by category in the `builtins`
//! modules. The compiler resolves a call by name and argument types
//! ([`resolve`]); the interpreter invokes the chosen descriptor's
//! implementation.
//!
//! # Overload selection
//!
//! Every descriptor with the called name and arity whose parameters accept
//! the argument types is a candidate. The candidate with the most exact
//! (same type, not just assignable) parameter matches wins. Two candidates
//! with the same score are ambiguous.
//!
//! Collection extensions (`where`, `sum`, ...) take an inner expression and
//! are catalogued separately in [`extensions`].

pub mod args;
pub mod builtins;
pub mod error;
pub mod extensions;
pub mod host;
pub mod ordering;

pub use error::FunctionError;
pub use extensions::{ExtensionOp, InnerRequirement};
pub use host::FunctionHost;
pub use linkme;

use linkme::distributed_slice;
use mudprog_foundation::{ProgType, ReturnType, Value};
use std::fmt;

/// Implementation of a built-in.
pub type BuiltinFn = fn(&[Value], &mut dyn FunctionHost) -> Result<Value, FunctionError>;

/// How a built-in's return type is derived from its argument types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnSpec {
    /// A fixed type, or Void
    Fixed(ReturnType),
    /// Same type as the argument at this position
    SameAs(usize),
    /// Element type of the container argument at this position
    ElementOf(usize),
    /// Collection of the element type of the container at this position
    CollectionOf(usize),
}

/// Extra typing rule beyond per-parameter assignability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// No extra rule
    None,
    /// The argument at `element` must be assignable to the element type of
    /// the collection at `collection`.
    ElementOf {
        /// Position of the collection argument
        collection: usize,
        /// Position of the element argument
        element: usize,
    },
}

/// A registered built-in function.
pub struct BuiltinDescriptor {
    /// Name used in prog source (lowercase)
    pub name: &'static str,
    /// Category tag (e.g. "math", "text", "world")
    pub category: &'static str,
    /// One-line documentation
    pub doc: &'static str,
    /// Parameter types, in order
    pub parameters: &'static [ProgType],
    /// Return type rule
    pub returns: ReturnSpec,
    /// Extra typing rule
    pub constraint: Constraint,
    /// The implementation
    pub implementation: BuiltinFn,
}

impl BuiltinDescriptor {
    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Invoke the implementation.
    pub fn call(&self, args: &[Value], host: &mut dyn FunctionHost) -> Result<Value, FunctionError> {
        (self.implementation)(args, host)
    }

    /// Human-readable signature, e.g. `round(Number, Number) -> Number`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        let returns = match self.returns {
            ReturnSpec::Fixed(ret) => ret.to_string(),
            ReturnSpec::SameAs(i) => format!("typeof(#{})", i + 1),
            ReturnSpec::ElementOf(i) => format!("elementof(#{})", i + 1),
            ReturnSpec::CollectionOf(i) => format!("collectionof(#{})", i + 1),
        };
        format!("{}({}) -> {}", self.name, params.join(", "), returns)
    }

    /// Score this descriptor against argument types.
    ///
    /// `None` in `args` stands for a `null` literal, which fits any single
    /// parameter. Returns the number of exact matches, or `None` if the
    /// descriptor cannot accept the arguments.
    fn score(&self, args: &[Option<ProgType>]) -> Option<usize> {
        if args.len() != self.parameters.len() {
            return None;
        }
        let mut exact = 0;
        for (param, arg) in self.parameters.iter().zip(args) {
            match arg {
                None if param.is_single() => {}
                None => return None,
                Some(actual) if actual == param => exact += 1,
                Some(actual) if actual.is_assignable_to(*param) => {}
                Some(_) => return None,
            }
        }
        if let Constraint::ElementOf {
            collection,
            element,
        } = self.constraint
            && let Some(Some(container)) = args.get(collection)
            && let Some(Some(item)) = args.get(element)
            && !item.is_assignable_to(container.element())
        {
            return None;
        }
        Some(exact)
    }

    /// Concrete return type for the given argument types.
    pub fn return_type(&self, args: &[Option<ProgType>]) -> ReturnType {
        let arg = |i: usize| {
            args.get(i)
                .copied()
                .flatten()
                .or_else(|| self.parameters.get(i).copied())
                .unwrap_or(ProgType::ANYTHING)
        };
        match self.returns {
            ReturnSpec::Fixed(ret) => ret,
            ReturnSpec::SameAs(i) => ReturnType::Value(arg(i)),
            ReturnSpec::ElementOf(i) => ReturnType::Value(arg(i).element()),
            ReturnSpec::CollectionOf(i) => ReturnType::Value(arg(i).element().collection()),
        }
    }
}

impl fmt::Debug for BuiltinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

impl PartialEq for BuiltinDescriptor {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Distributed slice collecting all built-in registrations.
#[distributed_slice]
pub static BUILTINS: [BuiltinDescriptor];

/// Every overload registered under `name`.
pub fn overloads(name: &str) -> impl Iterator<Item = &'static BuiltinDescriptor> + '_ {
    BUILTINS.iter().filter(move |b| b.name == name)
}

/// Check if a function name is a known built-in.
pub fn is_known(name: &str) -> bool {
    overloads(name).next().is_some()
}

/// Distinct categories, sorted.
pub fn categories() -> Vec<&'static str> {
    let mut cats: Vec<&'static str> = BUILTINS.iter().map(|b| b.category).collect();
    cats.sort_unstable();
    cats.dedup();
    cats
}

/// Why a call could not be resolved to a single built-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No built-in has this name.
    Unknown,
    /// Overloads exist but none accepts the argument types.
    NoMatch {
        /// Signatures of every overload with this name
        candidates: Vec<String>,
    },
    /// More than one overload is equally good.
    Ambiguous {
        /// Signatures of the tied overloads
        candidates: Vec<String>,
    },
}

/// A resolved call.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    /// The chosen overload
    pub descriptor: &'static BuiltinDescriptor,
    /// Return type for these arguments
    pub return_type: ReturnType,
}

/// Resolve a call by best-match overload.
pub fn resolve(name: &str, args: &[Option<ProgType>]) -> Result<Resolved, ResolveError> {
    let mut best: Vec<(&'static BuiltinDescriptor, usize)> = Vec::new();
    let mut any = false;
    for descriptor in overloads(name) {
        any = true;
        let Some(score) = descriptor.score(args) else {
            continue;
        };
        match best.first().map(|(_, top)| *top) {
            Some(top) if score < top => {}
            Some(top) if score == top => best.push((descriptor, score)),
            _ => best = vec![(descriptor, score)],
        }
    }
    if !any {
        return Err(ResolveError::Unknown);
    }
    match best.as_slice() {
        [] => Err(ResolveError::NoMatch {
            candidates: overloads(name).map(BuiltinDescriptor::signature).collect(),
        }),
        [(descriptor, _)] => Ok(Resolved {
            descriptor,
            return_type: descriptor.return_type(args),
        }),
        tied => Err(ResolveError::Ambiguous {
            candidates: tied.iter().map(|(d, _)| d.signature()).collect(),
        }),
    }
}

/// Declare and register a built-in.
///
/// ```ignore
/// builtin!(ABS, "abs", "math", "Absolute value", [ProgType::NUMBER] => ProgType::NUMBER,
///     |args, _| Ok(Value::number(number(args, 0, "abs")?.abs())));
/// ```
#[macro_export]
macro_rules! builtin {
    ($ident:ident, $name:literal, $category:literal, $doc:literal,
     [$($param:expr),* $(,)?] => $returns:expr, $constraint:expr, $imp:expr) => {
        #[$crate::linkme::distributed_slice($crate::BUILTINS)]
        #[linkme(crate = $crate::linkme)]
        static $ident: $crate::BuiltinDescriptor = $crate::BuiltinDescriptor {
            name: $name,
            category: $category,
            doc: $doc,
            parameters: &[$($param),*],
            returns: $returns,
            constraint: $constraint,
            implementation: $imp,
        };
    };
    ($ident:ident, $name:literal, $category:literal, $doc:literal,
     [$($param:expr),* $(,)?] => $returns:expr, $imp:expr) => {
        $crate::builtin!($ident, $name, $category, $doc, [$($param),*] => $returns,
            $crate::Constraint::None, $imp);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num() -> Option<ProgType> {
        Some(ProgType::NUMBER)
    }

    #[test]
    fn test_lookup() {
        assert!(is_known("abs"));
        assert!(is_known("count"));
        assert!(!is_known("nonexistent"));
    }

    #[test]
    fn test_overload_by_arity() {
        let one = resolve("round", &[num()]).unwrap();
        let two = resolve("round", &[num(), num()]).unwrap();
        assert_eq!(one.descriptor.arity(), 1);
        assert_eq!(two.descriptor.arity(), 2);
    }

    #[test]
    fn test_overload_by_type() {
        let text = resolve("contains", &[Some(ProgType::TEXT), Some(ProgType::TEXT)]).unwrap();
        assert_eq!(text.descriptor.category, "text");
        let coll = resolve(
            "contains",
            &[Some(ProgType::CHARACTER.collection()), Some(ProgType::CHARACTER)],
        )
        .unwrap();
        assert_eq!(coll.descriptor.category, "collection");
    }

    #[test]
    fn test_overload_by_entity_argument() {
        let by_name = resolve("location", &[Some(ProgType::TEXT)]).unwrap();
        assert_eq!(by_name.return_type, ReturnType::Value(ProgType::LOCATION));
        let of_char = resolve("location", &[Some(ProgType::CHARACTER)]).unwrap();
        assert_eq!(of_char.descriptor.parameters, &[ProgType::PERCEIVABLE]);
    }

    #[test]
    fn test_exact_match_beats_union() {
        let text = resolve(
            "contains",
            &[Some(ProgType::TEXT.collection()), Some(ProgType::TEXT)],
        )
        .unwrap();
        assert_eq!(
            text.descriptor.parameters,
            &[ProgType::TEXT.collection(), ProgType::TEXT]
        );
    }

    #[test]
    fn test_element_return_type() {
        let first = resolve("first", &[Some(ProgType::ITEM.collection())]).unwrap();
        assert_eq!(first.return_type, ReturnType::Value(ProgType::ITEM));
        let values = resolve("values", &[Some(ProgType::NUMBER.dictionary())]).unwrap();
        assert_eq!(
            values.return_type,
            ReturnType::Value(ProgType::NUMBER.collection())
        );
    }

    #[test]
    fn test_element_constraint_rejects_mismatch() {
        let err = resolve(
            "append",
            &[Some(ProgType::NUMBER.collection()), Some(ProgType::TEXT)],
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
    }

    #[test]
    fn test_no_match_lists_candidates() {
        match resolve("abs", &[Some(ProgType::TEXT)]) {
            Err(ResolveError::NoMatch { candidates }) => {
                assert_eq!(candidates, vec!["abs(Number) -> Number".to_string()]);
            }
            other => panic!("expected NoMatch, got {:?}", other),
        }
    }

    #[test]
    fn test_null_literal_fits_single_params() {
        assert!(resolve("isnull", &[None]).is_ok());
    }

    #[test]
    fn test_categories_present() {
        let cats = categories();
        for cat in ["collection", "datetime", "gender", "logic", "math", "output", "text", "world"] {
            assert!(cats.contains(&cat), "missing category {}", cat);
        }
    }
}

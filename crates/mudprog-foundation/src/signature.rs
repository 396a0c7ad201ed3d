//! Prog signatures.
//!
//! A prog either declares a typed parameter list, or accepts any arguments
//! without binding them by name. The two shapes are separate variants so
//! checked and unchecked binding cannot be conflated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ProgType;

/// Declared return type of a prog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnType {
    /// Returns nothing
    Void,
    /// Returns a value of this type
    Value(ProgType),
}

impl ReturnType {
    /// The value type, if not void.
    pub fn value_type(self) -> Option<ProgType> {
        match self {
            ReturnType::Void => None,
            ReturnType::Value(ty) => Some(ty),
        }
    }

    /// True for `Void`.
    pub fn is_void(self) -> bool {
        matches!(self, ReturnType::Void)
    }
}

impl From<ProgType> for ReturnType {
    fn from(value: ProgType) -> Self {
        ReturnType::Value(value)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => f.write_str("Void"),
            ReturnType::Value(ty) => write!(f, "{}", ty),
        }
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Name visible to the prog body
    pub name: String,
    /// Declared type
    pub ty: ProgType,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, ty: ProgType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Signature of a prog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgSignature {
    /// Checked binding: arguments must match the parameter list.
    Typed {
        /// Declared return type
        return_type: ReturnType,
        /// Ordered parameters
        parameters: Vec<Parameter>,
    },
    /// Unchecked binding: any arguments accepted, none bound by name.
    AnyParams {
        /// Declared return type
        return_type: ReturnType,
    },
}

impl ProgSignature {
    /// Typed signature.
    pub fn typed(return_type: impl Into<ReturnType>, parameters: Vec<Parameter>) -> Self {
        ProgSignature::Typed {
            return_type: return_type.into(),
            parameters,
        }
    }

    /// Signature accepting any arguments.
    pub fn any_params(return_type: impl Into<ReturnType>) -> Self {
        ProgSignature::AnyParams {
            return_type: return_type.into(),
        }
    }

    /// Declared return type.
    pub fn return_type(&self) -> ReturnType {
        match self {
            ProgSignature::Typed { return_type, .. } | ProgSignature::AnyParams { return_type } => {
                *return_type
            }
        }
    }

    /// Declared parameters, or `None` for `AnyParams`.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        match self {
            ProgSignature::Typed { parameters, .. } => Some(parameters),
            ProgSignature::AnyParams { .. } => None,
        }
    }

    /// True if the prog can be invoked with an empty argument list.
    pub fn accepts_no_arguments(&self) -> bool {
        self.parameters().is_none_or(<[Parameter]>::is_empty)
    }

    /// True if a caller passing values of `argument_types` would bind.
    ///
    /// This is the attach-time check used by hooks: every declared
    /// parameter must be assignable from the supplied type at the same
    /// position.
    pub fn accepts(&self, argument_types: &[ProgType]) -> bool {
        match self.parameters() {
            None => true,
            Some(params) => {
                params.len() == argument_types.len()
                    && params
                        .iter()
                        .zip(argument_types)
                        .all(|(param, actual)| actual.is_assignable_to(param.ty))
            }
        }
    }
}

impl fmt::Display for ProgSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgSignature::Typed {
                return_type,
                parameters,
            } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.ty))
                    .collect();
                write!(f, "({}) -> {}", params.join(", "), return_type)
            }
            ProgSignature::AnyParams { return_type } => write!(f, "(...) -> {}", return_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_checks_each_position() {
        let sig = ProgSignature::typed(
            ReturnType::Void,
            vec![
                Parameter::new("who", ProgType::PERCEIVABLE),
                Parameter::new("amount", ProgType::NUMBER),
            ],
        );
        assert!(sig.accepts(&[ProgType::CHARACTER, ProgType::NUMBER]));
        assert!(!sig.accepts(&[ProgType::NUMBER, ProgType::NUMBER]));
        assert!(!sig.accepts(&[ProgType::CHARACTER]));
    }

    #[test]
    fn test_any_params_accepts_everything() {
        let sig = ProgSignature::any_params(ProgType::NUMBER);
        assert!(sig.accepts(&[ProgType::TEXT, ProgType::ITEM]));
        assert!(sig.accepts_no_arguments());
        assert_eq!(sig.to_string(), "(...) -> Number");
    }
}

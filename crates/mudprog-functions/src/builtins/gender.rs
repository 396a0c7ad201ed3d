use mudprog_foundation::{Gender, ProgType, ReturnType, Value};

use crate::args::{entity, gender, text};
use crate::{FunctionError, ReturnSpec};

crate::builtin!(GENDER_OF, "gender", "gender", "Gender of a character or item",
    [ProgType::union(mudprog_foundation::Capability::Perceiver)]
        => ReturnSpec::Fixed(ReturnType::Value(ProgType::GENDER)),
    |args, host| {
        let target = entity(args, 0, "gender")?;
        Ok(Value::gender(
            host.world().gender(target).unwrap_or(Gender::Indeterminate),
        ))
    });

crate::builtin!(PRONOUN, "pronoun", "gender",
    "Pronoun for a gender: subjective, objective or possessive",
    [ProgType::GENDER, ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT)),
    |args, _| {
        let g = gender(args, 0, "pronoun")?;
        let form = text(args, 1, "pronoun")?;
        let pronoun = match form.to_ascii_lowercase().as_str() {
            "subjective" => g.subjective(),
            "objective" => g.objective(),
            "possessive" => g.possessive(),
            other => {
                return Err(FunctionError::InvalidArgument {
                    function: "pronoun",
                    message: format!("unknown pronoun form '{}'", other),
                });
            }
        };
        Ok(Value::text(pronoun))
    });

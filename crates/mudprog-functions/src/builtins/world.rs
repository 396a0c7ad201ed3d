use mudprog_foundation::{ConcreteKind, ProgType, ReturnType, Value};

use crate::args::{entity, text};
use crate::{FunctionError, FunctionHost, ReturnSpec};

const REF: ProgType = ProgType::REFERENCE;

fn lookup(args: &[Value], host: &dyn FunctionHost, kind: ConcreteKind, function: &'static str) -> Result<Value, FunctionError> {
    let key = text(args, 0, function)?;
    host.world()
        .lookup(kind, key)
        .map(Value::entity)
        .ok_or_else(|| FunctionError::LookupMiss {
            kind,
            key: key.to_string(),
        })
}

crate::builtin!(NAME, "name", "world", "Display name of an entity",
    [REF] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT)),
    |args, host| {
        let target = entity(args, 0, "name")?;
        host.world()
            .name(target)
            .map(Value::text)
            .ok_or_else(|| FunctionError::LookupMiss {
                kind: target.kind,
                key: target.id.to_string(),
            })
    });

crate::builtin!(ID, "id", "world", "Stable id of an entity",
    [REF] => ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER)),
    |args, _| Ok(Value::number(entity(args, 0, "id")?.id as f64)));

crate::builtin!(EXISTS, "exists", "world", "True if the entity is non-null and still exists",
    [REF] => ReturnSpec::Fixed(ReturnType::Value(ProgType::BOOLEAN)),
    |args, host| Ok(Value::boolean(
        args.first()
            .and_then(Value::as_entity)
            .is_some_and(|e| host.world().exists(e)),
    )));

crate::builtin!(CHARACTER, "character", "world", "Find a character by id or name",
    [ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::CHARACTER)),
    |args, host| lookup(args, host, ConcreteKind::Character, "character"));

crate::builtin!(ITEM, "item", "world", "Find an item by id or name",
    [ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::ITEM)),
    |args, host| lookup(args, host, ConcreteKind::Item, "item"));

crate::builtin!(LOCATION, "location", "world", "Find a location by id or name",
    [ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::LOCATION)),
    |args, host| lookup(args, host, ConcreteKind::Location, "location"));

crate::builtin!(LOCATION_OF, "location", "world", "Location currently containing the target",
    [ProgType::PERCEIVABLE] => ReturnSpec::Fixed(ReturnType::Value(ProgType::LOCATION)),
    |args, host| {
        let target = entity(args, 0, "location")?;
        Ok(host
            .world()
            .location_of(target)
            .map(Value::entity)
            .unwrap_or_else(|| Value::null(ProgType::LOCATION)))
    });

crate::builtin!(ZONE, "zone", "world", "Find a zone by id or name",
    [ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::ZONE)),
    |args, host| lookup(args, host, ConcreteKind::Zone, "zone"));

crate::builtin!(DESCRIBE, "describe", "world", "Name for entities, display form otherwise",
    [ProgType::ANYTHING] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT)),
    |args, host| {
        let Some(value) = args.first() else {
            return Ok(Value::text(""));
        };
        let described = value
            .as_entity()
            .and_then(|e| host.world().name(e))
            .unwrap_or_else(|| value.to_string());
        Ok(Value::text(described))
    });

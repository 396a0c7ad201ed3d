use mudprog_foundation::{Data, ProgType, ReturnType, Value};

use crate::args::{collection, keys, number, text};
use crate::ordering::values_equal;
use crate::{Constraint, FunctionError, FunctionHost, ReturnSpec};

const ANY_COLL: ProgType = ProgType::ANYTHING.collection();
const ANY_DICT: ProgType = ProgType::ANYTHING.dictionary();
const ANY_MULTI: ProgType = ProgType::ANYTHING.collection_dictionary();
const RET_NUM: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::NUMBER));
const RET_BOOL: ReturnSpec = ReturnSpec::Fixed(ReturnType::Value(ProgType::BOOLEAN));
const ELEMENT: Constraint = Constraint::ElementOf {
    collection: 0,
    element: 1,
};

fn with_items(template: &Value, items: Vec<Value>, host: &dyn FunctionHost) -> Result<Value, FunctionError> {
    let limit = host.max_collection_size();
    if items.len() > limit {
        return Err(FunctionError::CollectionTooLarge {
            len: items.len(),
            limit,
        });
    }
    Ok(Value::from_parts(template.ty(), Data::Collection(items)))
}

fn element_or_null(coll: &Value, item: Option<&Value>) -> Value {
    item.cloned()
        .unwrap_or_else(|| Value::null(coll.ty().element()))
}

crate::builtin!(COUNT, "count", "collection", "Number of elements", [ANY_COLL] => RET_NUM,
    |args, _| Ok(Value::number(collection(args, 0, "count")?.1.len() as f64)));

crate::builtin!(ISEMPTY, "isempty", "collection", "True if there are no elements",
    [ANY_COLL] => RET_BOOL,
    |args, _| Ok(Value::boolean(collection(args, 0, "isempty")?.1.is_empty())));

crate::builtin!(CONTAINS, "contains", "collection", "True if the collection holds the value",
    [ANY_COLL, ProgType::ANYTHING] => RET_BOOL, ELEMENT,
    |args, _| {
        let (_, items) = collection(args, 0, "contains")?;
        let needle = args.get(1).ok_or(FunctionError::ArgumentShape {
            function: "contains",
            position: 1,
        })?;
        Ok(Value::boolean(items.iter().any(|item| values_equal(item, needle))))
    });

crate::builtin!(CONTAINS_TEXT_ANY_CASE, "contains", "collection",
    "True if the text collection holds the text, ignoring case",
    [ProgType::TEXT.collection(), ProgType::TEXT] => RET_BOOL,
    |args, _| {
        let (_, items) = collection(args, 0, "contains")?;
        let needle = text(args, 1, "contains")?;
        Ok(Value::boolean(items.iter().any(|item| {
            item.as_text().is_some_and(|t| t.eq_ignore_ascii_case(needle))
        })))
    });

crate::builtin!(APPEND, "append", "collection", "Copy with the value added at the end",
    [ANY_COLL, ProgType::ANYTHING] => ReturnSpec::SameAs(0), ELEMENT,
    |args, host| {
        let (coll, items) = collection(args, 0, "append")?;
        let mut items = items.to_vec();
        items.push(args.get(1).cloned().unwrap_or_else(|| Value::null(coll.ty().element())));
        with_items(coll, items, host)
    });

crate::builtin!(REMOVE, "remove", "collection", "Copy without any element equal to the value",
    [ANY_COLL, ProgType::ANYTHING] => ReturnSpec::SameAs(0), ELEMENT,
    |args, host| {
        let (coll, items) = collection(args, 0, "remove")?;
        let needle = args.get(1).ok_or(FunctionError::ArgumentShape {
            function: "remove",
            position: 1,
        })?;
        let kept = items.iter().filter(|item| !values_equal(item, needle)).cloned().collect();
        with_items(coll, kept, host)
    });

crate::builtin!(FIRST, "first", "collection", "First element, or null if empty",
    [ANY_COLL] => ReturnSpec::ElementOf(0),
    |args, _| {
        let (coll, items) = collection(args, 0, "first")?;
        Ok(element_or_null(coll, items.first()))
    });

crate::builtin!(LAST, "last", "collection", "Last element, or null if empty",
    [ANY_COLL] => ReturnSpec::ElementOf(0),
    |args, _| {
        let (coll, items) = collection(args, 0, "last")?;
        Ok(element_or_null(coll, items.last()))
    });

crate::builtin!(AT, "at", "collection", "Element at a zero-based index",
    [ANY_COLL, ProgType::NUMBER] => ReturnSpec::ElementOf(0),
    |args, _| {
        let (_, items) = collection(args, 0, "at")?;
        let index = number(args, 1, "at")?;
        element_at(items, index)
    });

/// Element at a zero-based numeric index.
pub fn element_at(items: &[Value], index: f64) -> Result<Value, FunctionError> {
    if index.fract() != 0.0 || index < 0.0 || index as usize >= items.len() {
        return Err(FunctionError::IndexOutOfRange {
            index: index as i64,
            len: items.len(),
        });
    }
    Ok(items[index as usize].clone())
}

crate::builtin!(KEYS, "keys", "collection", "Keys of a dictionary, in insertion order",
    [ANY_DICT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT.collection())),
    |args, _| key_collection(args));

crate::builtin!(KEYS_MULTI, "keys", "collection", "Keys of a collection dictionary",
    [ANY_MULTI] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT.collection())),
    |args, _| key_collection(args));

fn key_collection(args: &[Value]) -> Result<Value, FunctionError> {
    let keys = keys(args, 0, "keys")?;
    Ok(Value::collection(
        ProgType::TEXT,
        keys.into_iter().map(Value::text).collect(),
    ))
}

crate::builtin!(VALUES, "values", "collection", "Values of a dictionary, in insertion order",
    [ANY_DICT] => ReturnSpec::CollectionOf(0),
    |args, _| {
        let dict = crate::args::dictionary(args, 0, "values")?;
        let element = args.first().map(|d| d.ty().element()).unwrap_or(ProgType::ANYTHING);
        Ok(Value::collection(element, dict.values().cloned().collect()))
    });

crate::builtin!(HASKEY, "haskey", "collection", "True if the dictionary has the key",
    [ANY_DICT, ProgType::TEXT] => RET_BOOL,
    |args, _| {
        let key = text(args, 1, "haskey")?;
        Ok(Value::boolean(keys(args, 0, "haskey")?.contains(&key)))
    });

crate::builtin!(HASKEY_MULTI, "haskey", "collection", "True if the collection dictionary has the key",
    [ANY_MULTI, ProgType::TEXT] => RET_BOOL,
    |args, _| {
        let key = text(args, 1, "haskey")?;
        Ok(Value::boolean(keys(args, 0, "haskey")?.contains(&key)))
    });

crate::builtin!(JOIN, "join", "collection", "Display forms joined by a separator",
    [ANY_COLL, ProgType::TEXT] => ReturnSpec::Fixed(ReturnType::Value(ProgType::TEXT)),
    |args, _| {
        let (_, items) = collection(args, 0, "join")?;
        let separator = text(args, 1, "join")?;
        let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
        Ok(Value::text(parts.join(separator)))
    });

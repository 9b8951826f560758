//! JSON Schema to example-value synthesis for request bodies.
//!
//! `None` means "unknown": the depth cap was hit or a `$ref` pointed nowhere.
//! Callers embed it as JSON `null`.

use serde_json::{Map, Value, json};

/// Deepest nesting level that still produces a value
pub const MAX_DEPTH: usize = 4;

/// `$ref` hops followed without descending, bounds `A -> B -> A` alias loops
const MAX_REF_HOPS: usize = 16;

const DATE_TIME_STUB: &str = "2024-01-01T00:00:00Z";
const DATE_STUB: &str = "2024-01-01";
const EMAIL_STUB: &str = "user@example.com";
const UUID_STUB: &str = "00000000-0000-0000-0000-000000000000";

/// Whole source document, used only for `$ref` lookups
#[derive(Debug, Clone, Copy)]
pub struct SchemaContext<'a> {
    document: &'a Value,
}

enum Resolved<'a> {
    Node(&'a Value),
    External,
    Missing,
}

impl<'a> SchemaContext<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self { document }
    }

    fn resolve(&self, reference: &str) -> Resolved<'a> {
        let Some(pointer) = reference.strip_prefix("#/") else {
            return Resolved::External;
        };

        let mut node = self.document;
        for part in pointer.split('/') {
            let part = part.replace("~1", "/").replace("~0", "~");
            match node.get(part.as_str()) {
                Some(next) => node = next,
                None => return Resolved::Missing,
            }
        }

        if node.is_object() {
            Resolved::Node(node)
        } else {
            Resolved::Missing
        }
    }
}

/// Stub a schema against `document`, starting at depth 0
pub fn schema_to_stub(schema: &Value, document: &Value) -> Option<Value> {
    stub(schema, &SchemaContext::new(document), 0)
}

pub fn stub(schema: &Value, ctx: &SchemaContext<'_>, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    let mut node = schema.as_object()?;

    // a resolved reference replaces the node at the same depth
    let mut hops = 0;
    while let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if hops == MAX_REF_HOPS {
            return None;
        }
        hops += 1;
        node = match ctx.resolve(reference) {
            Resolved::Node(target) => target.as_object()?,
            Resolved::External => return Some(Value::Object(Map::new())),
            Resolved::Missing => return None,
        };
    }

    match schema_type(node) {
        Some("string") => Some(string_stub(node)),
        Some("integer") | Some("number") => Some(json!(0)),
        Some("boolean") => Some(Value::Bool(false)),
        Some("array") => {
            let empty = Value::Object(Map::new());
            let items = node.get("items").unwrap_or(&empty);
            Some(Value::Array(vec![
                stub(items, ctx, depth + 1).unwrap_or(Value::Null),
            ]))
        }
        _ if node.contains_key("properties") => Some(object_stub(node, ctx, depth)),
        Some("object") if !has_composition(node) => Some(object_stub(node, ctx, depth)),
        _ => Some(composition_stub(node, ctx, depth)),
    }
}

/// `type` may be a string or, in OpenAPI 3.1, a list such as `["string", "null"]`
fn schema_type(node: &Map<String, Value>) -> Option<&str> {
    match node.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

fn has_composition(node: &Map<String, Value>) -> bool {
    ["allOf", "oneOf", "anyOf"]
        .iter()
        .any(|key| node.contains_key(*key))
}

fn string_stub(node: &Map<String, Value>) -> Value {
    match node.get("format").and_then(Value::as_str) {
        Some("date-time") => return json!(DATE_TIME_STUB),
        Some("date") => return json!(DATE_STUB),
        Some("email") => return json!(EMAIL_STUB),
        Some("uuid") => return json!(UUID_STUB),
        _ => {}
    }

    node.get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
        .cloned()
        .unwrap_or_else(|| json!(""))
}

fn object_stub(node: &Map<String, Value>, ctx: &SchemaContext<'_>, depth: usize) -> Value {
    let mut out = Map::new();
    if let Some(properties) = node.get("properties").and_then(Value::as_object) {
        for (name, prop) in properties {
            out.insert(
                name.clone(),
                stub(prop, ctx, depth + 1).unwrap_or(Value::Null),
            );
        }
    }
    Value::Object(out)
}

fn composition_stub(node: &Map<String, Value>, ctx: &SchemaContext<'_>, depth: usize) -> Value {
    if let Some(branches) = node.get("allOf").and_then(Value::as_array) {
        // later branches overwrite earlier keys
        let mut merged = Map::new();
        for branch in branches {
            if let Some(Value::Object(fields)) = stub(branch, ctx, depth + 1) {
                merged.extend(fields);
            }
        }
        return Value::Object(merged);
    }

    let variants = node
        .get("oneOf")
        .and_then(Value::as_array)
        .filter(|v| !v.is_empty())
        .or_else(|| node.get("anyOf").and_then(Value::as_array));
    match variants.and_then(|v| v.first()) {
        Some(first) => stub(first, ctx, depth + 1).unwrap_or(Value::Null),
        None => Value::Object(Map::new()),
    }
}

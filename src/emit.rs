//! Compiled type → self-contained JSON Schema.
//!
//! References are already inlined, so the output never carries `$ref` or
//! `definitions`. Optionality moves back into the parent's `required` list.
use serde_json::{json, Map, Value};

use crate::ir::{Field, FieldDefault, Leaf, Record, Ty};

pub fn schema_from_ty(ty: &Ty) -> Value {
    match ty {
        Ty::Record(record) => schema_from_record(record),
        Ty::List { item } => json!({ "type": "array", "items": schema_from_ty(item) }),
        Ty::Set { item } => json!({
            "type": "array",
            "items": schema_from_ty(item),
            "uniqueItems": true,
        }),
        // Emit oneOf over child schemas; no de-duplication, order is meaningful.
        Ty::OneOf { arms } => json!({ "oneOf": arms.iter().map(schema_from_ty).collect::<Vec<_>>() }),
        Ty::Optional { inner } => schema_from_ty(inner),
        Ty::Leaf { leaf } => schema_from_leaf(leaf),
    }
}

fn schema_from_leaf(leaf: &Leaf) -> Value {
    match leaf {
        Leaf::String => json!({ "type": "string" }),
        Leaf::Uri => json!({ "type": "string", "format": "iri" }),
        Leaf::Number => json!({ "type": "number" }),
        Leaf::Literal(value) => json!({ "type": "string", "const": value }),
    }
}

fn schema_from_record(record: &Record) -> Value {
    let mut map = Map::new();
    if let Some(title) = &record.title {
        map.insert("title".into(), Value::from(title.as_str()));
    }
    if let Some(description) = &record.description {
        map.insert("description".into(), Value::from(description.as_str()));
    }
    map.insert("type".into(), Value::from("object"));

    let mut properties = Map::new();
    for field in &record.fields {
        properties.insert(field.name.clone(), schema_from_field(field));
    }
    map.insert("properties".into(), Value::Object(properties));

    let required: Vec<Value> = record
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| Value::from(f.name.as_str()))
        .collect();
    // An explicit list keeps "all required" and "none required" distinguishable.
    if required.len() != record.fields.len() {
        map.insert("required".into(), Value::Array(required));
    }
    Value::Object(map)
}

fn schema_from_field(field: &Field) -> Value {
    let mut schema = schema_from_ty(&field.ty);
    let Some(map) = schema.as_object_mut() else {
        return schema;
    };
    if let Some(title) = &field.title {
        map.insert("title".into(), Value::from(title.as_str()));
    }
    if let Some(description) = &field.description {
        map.insert("description".into(), Value::from(description.as_str()));
    }
    if let Some(n) = field.constraints.min_length {
        map.insert("minLength".into(), Value::from(n));
    }
    if let Some(n) = field.constraints.max_length {
        map.insert("maxLength".into(), Value::from(n));
    }
    if let Some(values) = &field.constraints.allowed {
        map.insert("enum".into(), Value::Array(values.clone()));
    }
    // literals already carry their value as `const`
    if let FieldDefault::Value(value) = &field.default {
        if !matches!(field.ty.base(), Ty::Leaf { leaf: Leaf::Literal(_) }) {
            map.insert("default".into(), value.clone());
        }
    }
    schema
}

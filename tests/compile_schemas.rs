//! End-to-end compilation of the reference schemas: properties, optionality,
//! definitions, oneOf, allOf and unique items.

use json_model::{compile, CompileError, FieldDefault, Leaf, Registry, Ty};
use serde_json::{json, Value};

fn uri() -> Ty {
    Ty::leaf(Leaf::Uri)
}

fn string() -> Ty {
    Ty::leaf(Leaf::String)
}

fn number() -> Ty {
    Ty::leaf(Leaf::Number)
}

fn literal(value: &str) -> Ty {
    Ty::leaf(Leaf::Literal(value.to_string()))
}

fn field_types(ty: &Ty) -> Vec<(String, Ty)> {
    ty.as_record()
        .expect("record")
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.ty.clone()))
        .collect()
}

fn named(pairs: Vec<(&str, Ty)>) -> Vec<(String, Ty)> {
    pairs.into_iter().map(|(n, t)| (n.to_string(), t)).collect()
}

fn base_properties() -> Value {
    json!({
        "href": {"title": "Link reference", "type": "string", "format": "iri-reference"},
        "title": {"title": "A String field", "type": "string", "minLength": 1},
        "version": {"title": "Version number", "type": "string", "const": "1.0.0"},
        "links": {
            "title": "Item links",
            "description": "Links to item relations",
            "type": "array",
            "items": {"type": "string", "format": "iri"}
        },
        "count": {"title": "A number field", "type": "number"}
    })
}

#[test]
fn properties_with_definitions() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "https://link.to.schema#",
        "title": "Test Schema",
        "type": "object",
        "description": "This is a test schema.",
        "definitions": {
            "links": {
                "title": "Item links",
                "description": "Links to item relations",
                "type": "array",
                "items": {"type": "string", "format": "iri"}
            }
        },
        "properties": {
            "href": {"title": "Link reference", "type": "string", "format": "iri-reference"},
            "title": {"title": "A String field", "type": "string", "minLength": 1},
            "version": {"title": "Version number", "type": "string", "const": "1.0.0"},
            "links": {"$ref": "#/definitions/links"},
            "count": {"title": "A number field", "type": "number"}
        }
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    assert_eq!(
        field_types(&ty),
        named(vec![
            ("href", uri()),
            ("title", string()),
            ("version", literal("1.0.0")),
            ("links", Ty::list(uri())),
            ("count", number()),
        ])
    );
    let record = ty.as_record().unwrap();
    assert_eq!(record.title.as_deref(), Some("Test Schema"));
    assert_eq!(record.description.as_deref(), Some("This is a test schema."));
}

#[test]
fn optional_properties() {
    let schema = json!({
        "type": "object",
        "required": ["href"],
        "properties": base_properties()
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    assert_eq!(
        field_types(&ty),
        named(vec![
            ("href", uri()),
            ("title", Ty::optional(string())),
            ("version", Ty::optional(literal("1.0.0"))),
            ("links", Ty::optional(Ty::list(uri()))),
            ("count", Ty::optional(number())),
        ])
    );

    let record = ty.as_record().unwrap();
    let href = record.field("href").unwrap();
    assert!(href.required);
    assert_eq!(href.default, FieldDefault::Required);

    let version = record.field("version").unwrap();
    assert!(!version.required);
    assert_eq!(version.default, FieldDefault::Value(json!("1.0.0")));

    let count = record.field("count").unwrap();
    assert_eq!(count.default, FieldDefault::NoValue);
    assert_eq!(count.title.as_deref(), Some("A number field"));

    let title = record.field("title").unwrap();
    assert_eq!(title.constraints.min_length, Some(1));

    let links = record.field("links").unwrap();
    assert_eq!(links.description.as_deref(), Some("Links to item relations"));
}

#[test]
fn one_of_references() {
    let schema = json!({
        "type": "object",
        "definitions": {
            "links": {"type": "array", "items": {"type": "string", "format": "iri"}},
            "href": {"type": "string", "format": "iri-reference"}
        },
        "properties": {
            "links": {"oneOf": [{"$ref": "#/definitions/links"}, {"$ref": "#/definitions/href"}]},
            "title": {"type": "string", "minLength": 1},
            "version": {"type": "string", "const": "1.0.0"},
            "count": {"type": "number"}
        }
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    assert_eq!(
        field_types(&ty),
        named(vec![
            ("links", Ty::OneOf { arms: vec![Ty::list(uri()), uri()] }),
            ("title", string()),
            ("version", literal("1.0.0")),
            ("count", number()),
        ])
    );
}

#[test]
fn one_of_keeps_every_alternative_in_order() {
    let alternatives = vec![
        json!({"type": "number"}),
        json!({"type": "string"}),
        json!({"type": "number"}),
        json!({"type": "string", "const": "x"}),
    ];
    let ty = compile(json!({"oneOf": alternatives}), &Registry::new()).unwrap();
    assert_eq!(
        ty,
        Ty::OneOf { arms: vec![number(), string(), number(), literal("x")] }
    );
}

#[test]
fn unique_items() {
    let schema = json!({
        "type": "object",
        "properties": {
            "links": {"type": "array", "items": {"type": "string", "format": "iri"}},
            "unique_links": {
                "type": "array",
                "items": {"type": "string", "format": "iri"},
                "uniqueItems": true
            }
        }
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    assert_eq!(
        field_types(&ty),
        named(vec![("links", Ty::list(uri())), ("unique_links", Ty::set(uri()))])
    );
}

#[test]
fn array_without_items_is_a_missing_field() {
    let err = compile(
        json!({"properties": {"tags": {"type": "array", "uniqueItems": true}}}),
        &Registry::new(),
    )
    .unwrap_err();
    match err {
        CompileError::MissingField { field, at } => {
            assert_eq!(field, "items");
            assert_eq!(at, "#/properties/tags");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn string_enum_is_carried_as_a_constraint() {
    let schema = json!({
        "type": "object",
        "properties": {"value": {"type": "string", "enum": ["nan", "inf", "-inf"]}}
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    let value = &ty.as_record().unwrap().fields[0];
    assert_eq!(value.ty, string());
    assert_eq!(
        value.constraints.allowed.as_deref(),
        Some(&[json!("nan"), json!("inf"), json!("-inf")][..])
    );
}

#[test]
fn all_of_merges_disjoint_records() {
    let schema = json!({
        "allOf": [
            {"required": ["href"], "properties": {
                "href": {"type": "string", "format": "iri"},
                "note": {"type": "string", "maxLength": 10}
            }},
            {"type": "object", "properties": {"count": {"type": "number"}}}
        ]
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    let record = ty.as_record().unwrap();
    assert_eq!(record.field_names(), vec!["href", "note", "count"]);
    assert!(record.field("href").unwrap().required);
    let note = record.field("note").unwrap();
    assert!(!note.required);
    assert_eq!(note.constraints.max_length, Some(10));
    assert!(record.field("count").unwrap().required);
}

#[test]
fn all_of_collision_intersects_instead_of_overwriting() {
    let schema = json!({
        "allOf": [
            {"properties": {"name": {"type": "string", "minLength": 2, "title": "Name"}}},
            {"required": [], "properties": {"name": {"type": "string", "maxLength": 8}}}
        ]
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    let name = &ty.as_record().unwrap().fields[0];
    assert!(name.required);
    assert_eq!(name.ty, string());
    assert_eq!(name.constraints.min_length, Some(2));
    assert_eq!(name.constraints.max_length, Some(8));
    assert_eq!(name.title.as_deref(), Some("Name"));
}

#[test]
fn all_of_type_clash_is_a_conflict() {
    let schema = json!({
        "allOf": [
            {"properties": {"id": {"type": "string"}}},
            {"properties": {"id": {"type": "number"}}}
        ]
    });
    let err = compile(schema, &Registry::new()).unwrap_err();
    match err {
        CompileError::FieldConflict { field, .. } => assert_eq!(field, "id"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn all_of_over_a_scalar_is_unsupported() {
    let schema = json!({"allOf": [{"properties": {"a": {"type": "number"}}}, {"type": "number"}]});
    let err = compile(schema, &Registry::new()).unwrap_err();
    match err {
        CompileError::UnsupportedSchema { at, .. } => assert_eq!(at, "#"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn any_of_fails_loudly() {
    let schema = json!({"properties": {"x": {"anyOf": [{"type": "number"}, {"type": "string"}]}}});
    let err = compile(schema, &Registry::new()).unwrap_err();
    match err {
        CompileError::NotImplemented { keyword, at } => {
            assert_eq!(keyword, "anyOf");
            assert_eq!(at, "#/properties/x");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn one_of_takes_precedence_over_any_of_and_all_of() {
    let schema = json!({
        "oneOf": [{"type": "number"}],
        "anyOf": [{"type": "string"}],
        "allOf": [{"type": "string"}]
    });
    let ty = compile(schema, &Registry::new()).unwrap();
    assert_eq!(ty, Ty::OneOf { arms: vec![number()] });
}

#[test]
fn empty_combinators_are_ignored() {
    let ty = compile(json!({"oneOf": [], "anyOf": [], "type": "number"}), &Registry::new()).unwrap();
    assert_eq!(ty, number());
}

#[test]
fn ignored_keywords_do_not_change_the_result() {
    let ty = compile(
        json!({
            "type": "object",
            "properties": {"n": {"type": "number", "minimum": 0, "maximum": 10}},
            "if": {"properties": {"n": {"const": 1}}},
            "then": {"required": ["n"]},
            "patternProperties": {"^x-": {"type": "string"}}
        }),
        &Registry::new(),
    )
    .unwrap();
    let n = &ty.as_record().unwrap().fields[0];
    assert_eq!(n.ty, number());
    assert!(n.constraints.is_empty());
}

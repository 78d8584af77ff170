//! Schema sources: inline values, files on disk and bundled documents.

use std::io::Write;

use json_model::{
    compile, CompileError, Compiler, LoaderError, Leaf, Location, Registry, SchemaSource,
    StaticLoader, Ty,
};
use serde_json::json;
use tempfile::{NamedTempFile, TempDir};

fn item_schema() -> serde_json::Value {
    json!({
        "title": "Test Schema",
        "type": "object",
        "properties": {
            "href": {"type": "string", "format": "iri-reference"},
            "title": {"type": "string", "minLength": 1},
            "version": {"type": "string", "const": "1.0.0"},
            "links": {"type": "array", "items": {"type": "string", "format": "iri"}},
            "count": {"type": "number"}
        }
    })
}

#[test]
fn file_source_matches_inline_source() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&item_schema()).unwrap().as_bytes()).unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    let from_file = compile(path, &Registry::new()).unwrap();
    let inline = compile(item_schema(), &Registry::new()).unwrap();
    assert_eq!(from_file, inline);
    assert_eq!(
        from_file.as_record().unwrap().field_names(),
        vec!["href", "title", "version", "links", "count"]
    );
}

#[test]
fn relative_file_references_resolve_next_to_the_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("common.json"),
        r#"{"definitions": {"link": {"type": "string", "format": "iri"}}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("root.json"),
        r#"{"properties": {"self": {"$ref": "common.json#/definitions/link"}}}"#,
    )
    .unwrap();

    let ty = compile(dir.path().join("root.json"), &Registry::new()).unwrap();
    assert_eq!(ty.as_record().unwrap().fields[0].ty, Ty::leaf(Leaf::Uri));
}

#[test]
fn pointer_fragment_into_another_document() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("other.json"),
        r#"{"properties": {"tags": {"type": "array", "items": {"type": "string"}, "uniqueItems": true}}}"#,
    )
    .unwrap();
    let reference = format!("{}#/properties/tags", dir.path().join("other.json").display());
    let ty = compile(json!({"$ref": reference}), &Registry::new()).unwrap();
    assert_eq!(ty, Ty::set(Ty::leaf(Leaf::String)));
}

#[test]
fn invalid_json_reports_the_location() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"properties": {"a": }"#).unwrap();
    file.flush().unwrap();

    let err = compile(file.path(), &Registry::new()).unwrap_err();
    match err {
        CompileError::Loader(LoaderError::Parse { location, .. }) => {
            assert_eq!(location, file.path().display().to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_is_a_loader_error() {
    let err = compile("/no/such/schema.json", &Registry::new()).unwrap_err();
    assert!(matches!(err, CompileError::Loader(LoaderError::Io { .. })), "{err}");
}

#[test]
fn strings_with_scheme_and_host_are_urls() {
    assert!(matches!(
        SchemaSource::from("https://example.com/schema.json"),
        SchemaSource::Location(Location::Url(_))
    ));
    assert!(matches!(
        SchemaSource::from("schemas/item.json"),
        SchemaSource::Location(Location::Path(_))
    ));
}

#[test]
fn bundled_documents_stand_in_for_the_network() {
    let loader = StaticLoader::new()
        .with("https://example.com/item.json", item_schema())
        .with(
            "https://example.com/page.json",
            json!({"properties": {"items": {"type": "array", "items": {"$ref": "item.json"}}}}),
        );
    let ty = Compiler::with_loader(loader)
        .compile("https://example.com/page.json", &Registry::new())
        .unwrap();
    let items = &ty.as_record().unwrap().fields[0];
    let Ty::List { item } = &items.ty else { panic!("expected a list: {:?}", items.ty) };
    assert_eq!(item.as_record().unwrap().title.as_deref(), Some("Test Schema"));
}

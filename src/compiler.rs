//! Schema compiler: walks a JSON Schema tree and produces a compiled type tree.
//!
//! Resolution order for a node (first match wins):
//! 1. `$ref` → registry entry (local) or loaded document (external)
//! 2. `definitions` / `$defs` → harvested into a new scope layer
//! 3. `oneOf` → union, 4. `anyOf` → not implemented, 5. `allOf` → merged record
//! 6. object, 7. array, 8. scalar leaf
//!
//! Design notes:
//! - One scope per top-level call, never shared. Nested `definitions`
//!   blocks push a layer; a definition compiles in the layer that declared it.
//! - No local recovery: the first error aborts the whole compile.
//! - Node helpers live in `object`, `compose` and `scalar`.
pub mod compose;
pub mod object;
pub mod scalar;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{CompileError, Result};
use crate::ir::{Record, Ty};
use crate::loader::{DefaultLoader, Location, SchemaLoader, SchemaSource};
use crate::registry::{PendingDefinition, Registry, Scope, Slot};

const DEFINITION_KEYS: [&str; 2] = ["definitions", "$defs"];

// keywords we knowingly leave uncompiled
const IGNORED_KEYWORDS: [&str; 5] = ["if", "then", "else", "not", "patternProperties"];

// ------------------------------- Entry ----------------------------------- //

/// Compile `source` with the default file/HTTP loader.
///
/// `predefined` is copied; document-local definitions with the same name
/// override its entries for this call only.
pub fn compile(source: impl Into<SchemaSource>, predefined: &Registry) -> Result<Ty> {
    Compiler::new().compile(source, predefined)
}

#[derive(Debug, Default)]
pub struct Compiler<L = DefaultLoader> {
    loader: L,
}

impl Compiler<DefaultLoader> {
    pub fn new() -> Self {
        Self { loader: DefaultLoader::new() }
    }
}

impl<L: SchemaLoader> Compiler<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Each call owns its registry copy, so one `Compiler` can serve
    /// concurrent top-level compilations.
    pub fn compile(&self, source: impl Into<SchemaSource>, predefined: &Registry) -> Result<Ty> {
        let mut walk = Walk::new(&self.loader, predefined.clone());
        match source.into() {
            SchemaSource::Inline(node) => walk.compile_node(&node),
            SchemaSource::Location(location) => {
                let document = self.loader.load(&location)?;
                walk.loading.push(location.clone());
                walk.doc = Some(location);
                walk.compile_node(&document)
            }
        }
    }
}

// ------------------------------- Walk ------------------------------------ //

/// Per-call traversal state. Never outlives one top-level compile.
pub(crate) struct Walk<'l> {
    loader: &'l dyn SchemaLoader,
    scope: Scope,
    doc: Option<Location>,  // document being compiled (None for inline)
    path: Vec<String>,      // pointer segments inside `doc`
    loading: Vec<Location>, // external documents on the current stack
}

impl<'l> Walk<'l> {
    fn new(loader: &'l dyn SchemaLoader, predefined: Registry) -> Self {
        Self {
            loader,
            scope: Scope::new(predefined),
            doc: None,
            path: Vec::new(),
            loading: Vec::new(),
        }
    }

    pub(crate) fn compile_node(&mut self, node: &Value) -> Result<Ty> {
        let Some(map) = node.as_object() else {
            return Err(self.unsupported("schema node must be an object"));
        };
        trace!(at = %self.at(), "compiling node");

        if let Some(reference) = map.get("$ref") {
            let Some(reference) = reference.as_str() else {
                return Err(self.unsupported("`$ref` must be a string"));
            };
            return self.compile_reference(reference);
        }

        self.note_ignored(map);
        self.with_definitions(map, |walk| walk.compile_shape(map))
    }

    fn compile_shape(&mut self, map: &Map<String, Value>) -> Result<Ty> {
        if let Some(alternatives) = self.combinator(map, "oneOf")? {
            return self.compile_one_of(alternatives);
        }
        if self.combinator(map, "anyOf")?.is_some() {
            return Err(CompileError::NotImplemented { keyword: "anyOf", at: self.at() });
        }
        if let Some(members) = self.combinator(map, "allOf")? {
            return self.compile_all_of(members);
        }

        let has_properties = map
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|properties| !properties.is_empty());
        match map.get("type").and_then(Value::as_str) {
            Some("object") => self.compile_object(map),
            None if has_properties && !map.contains_key("type") => self.compile_object(map),
            Some("array") => self.compile_array(map),
            _ => self.resolve_scalar(map),
        }
    }

    // ---------------------------- References ----------------------------- //

    fn compile_reference(&mut self, reference: &str) -> Result<Ty> {
        debug!(reference, at = %self.at(), "resolving reference");
        match reference.strip_prefix('#') {
            Some(fragment) => match definition_name(fragment) {
                Some(name) => self.resolve_definition(&name, reference),
                None => Err(self.unresolved(reference)),
            },
            None => self.compile_external(reference),
        }
    }

    /// Look up a named definition, compiling a pending one on demand.
    ///
    /// A pending body compiles with only the layers visible where it was
    /// declared, and the result is stored back in that layer, so every
    /// reference to it sees the same type.
    fn resolve_definition(&mut self, name: &str, reference: &str) -> Result<Ty> {
        let layer = match self.scope.lookup(name) {
            None => return Err(self.unresolved(reference)),
            Some((_, Slot::Ready(ty))) => return Ok(ty.clone()),
            Some((_, Slot::Compiling)) => {
                return Err(CompileError::CyclicReference {
                    reference: reference.to_string(),
                    at: self.at(),
                });
            }
            Some((layer, Slot::Pending(_))) => layer,
        };
        let Some(definition) = self.scope.begin(layer, name) else {
            return Err(self.unresolved(reference));
        };

        let hidden = self.scope.hide_above(layer);
        let result = self.compile_definition(definition);
        self.scope.restore(hidden);

        let ty = result?;
        self.scope.fill(layer, name, ty.clone());
        Ok(ty)
    }

    fn compile_definition(&mut self, definition: PendingDefinition) -> Result<Ty> {
        let PendingDefinition { node, base, path } = definition;
        self.within(base, path, |walk| walk.compile_node(&node))
    }

    fn compile_external(&mut self, reference: &str) -> Result<Ty> {
        let (href, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        let location = Location::resolve(href, self.doc.as_ref());
        if self.loading.contains(&location) {
            return Err(CompileError::CyclicReference {
                reference: reference.to_string(),
                at: self.at(),
            });
        }

        let document = self.loader.load(&location)?;
        self.loading.push(location.clone());
        let result = self.within(Some(location), Vec::new(), |walk| {
            walk.compile_document(&document, fragment, reference)
        });
        self.loading.pop();
        result
    }

    /// Compile a loaded document, or the part of it named by `fragment`, with
    /// the document's own definitions in scope.
    fn compile_document(&mut self, document: &Value, fragment: &str, reference: &str) -> Result<Ty> {
        if fragment.is_empty() {
            return self.compile_node(document);
        }
        let Some(map) = document.as_object() else {
            return Err(self.unsupported("schema document must be an object"));
        };
        self.with_definitions(map, |walk| {
            if let Some(name) = definition_name(fragment) {
                return walk.resolve_definition(&name, reference);
            }
            let Some(node) = document.pointer(fragment) else {
                return Err(walk.unresolved(reference));
            };
            let path = fragment.split('/').skip(1).map(unescape_pointer).collect();
            walk.within(walk.doc.clone(), path, |walk| walk.compile_node(node))
        })
    }

    // ---------------------------- Definitions ---------------------------- //

    /// Run `f` with the definitions declared on `map` as the innermost layer.
    ///
    /// Every definition is compiled up front, in declaration order, so a broken
    /// definition fails even when nothing references it.
    fn with_definitions<T>(
        &mut self,
        map: &Map<String, Value>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let Some((layer, declared)) = self.harvest(map)? else {
            return f(self);
        };
        self.scope.push(layer);
        let out = self.resolve_all(&declared).and_then(|()| f(self));
        self.scope.pop();
        out
    }

    /// Declare every definition on `map` as pending in a fresh layer.
    /// `None` when the node carries no definitions.
    fn harvest(&self, map: &Map<String, Value>) -> Result<Option<(Registry, Vec<(String, String)>)>> {
        let mut blocks = Vec::new();
        for key in DEFINITION_KEYS {
            match map.get(key) {
                None | Some(Value::Null) => {}
                Some(Value::Object(block)) if block.is_empty() => {}
                Some(Value::Object(block)) => blocks.push((key, block)),
                Some(_) => return Err(self.unsupported(format!("`{key}` must be an object"))),
            }
        }
        if blocks.is_empty() {
            return Ok(None);
        }

        let mut layer = Registry::new();
        let mut declared = Vec::new();
        for (key, block) in blocks {
            for (name, node) in block {
                let mut path = self.path.clone();
                path.extend([key.to_string(), name.clone()]);
                layer.declare(name, PendingDefinition {
                    node: node.clone(),
                    base: self.doc.clone(),
                    path,
                });
                declared.push((name.clone(), format!("#/{key}/{}", escape_pointer(name))));
            }
        }
        debug!(count = declared.len(), at = %self.at(), "harvesting definitions");
        Ok(Some((layer, declared)))
    }

    fn resolve_all(&mut self, declared: &[(String, String)]) -> Result<()> {
        for (name, reference) in declared {
            self.resolve_definition(name, reference)?;
        }
        Ok(())
    }

    // ---------------------------- Combinators ---------------------------- //

    fn combinator<'n>(&self, map: &'n Map<String, Value>, key: &str) -> Result<Option<&'n [Value]>> {
        match map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) if items.is_empty() => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(_) => Err(self.unsupported(format!("`{key}` must be an array"))),
        }
    }

    fn compile_one_of(&mut self, alternatives: &[Value]) -> Result<Ty> {
        let mut arms = Vec::with_capacity(alternatives.len());
        for (index, alternative) in alternatives.iter().enumerate() {
            let index = index.to_string();
            let ty = self.descend(&["oneOf", index.as_str()], |walk| walk.compile_node(alternative))?;
            arms.push(ty);
        }
        Ok(compose::union(arms))
    }

    fn compile_all_of(&mut self, members: &[Value]) -> Result<Ty> {
        let mut records: Vec<Record> = Vec::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            let index = index.to_string();
            let ty = self.descend(&["allOf", index.as_str()], |walk| walk.compile_node(member))?;
            match ty {
                Ty::Record(record) => records.push(record),
                _ => {
                    return Err(self.unsupported(format!(
                        "allOf member {index} does not compile to an object"
                    )));
                }
            }
        }

        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return Err(self.unsupported("allOf has no members"));
        };
        let merged = records.try_fold(first, compose::merge).map_err(|conflict| {
            CompileError::FieldConflict {
                field: conflict.field,
                at: self.at(),
                reason: conflict.reason,
            }
        })?;
        Ok(Ty::Record(merged))
    }

    fn compile_array(&mut self, map: &Map<String, Value>) -> Result<Ty> {
        let Some(items) = map.get("items") else {
            return Err(CompileError::MissingField { field: "items", at: self.at() });
        };
        let item = self.descend(&["items"], |walk| walk.compile_node(items))?;
        let unique = map.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false);
        Ok(compose::collection(item, unique))
    }

    // ------------------------------ Context ------------------------------ //

    fn descend<T>(&mut self, segments: &[&str], f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let depth = self.path.len();
        self.path.extend(segments.iter().map(|s| s.to_string()));
        let out = f(self);
        self.path.truncate(depth);
        out
    }

    /// Run `f` as if positioned at `path` inside `doc`, then restore.
    fn within<T>(
        &mut self,
        doc: Option<Location>,
        path: Vec<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_doc = std::mem::replace(&mut self.doc, doc);
        let saved_path = std::mem::replace(&mut self.path, path);
        let out = f(self);
        self.doc = saved_doc;
        self.path = saved_path;
        out
    }

    fn note_ignored(&self, map: &Map<String, Value>) {
        for keyword in IGNORED_KEYWORDS {
            if map.contains_key(keyword) {
                debug!(keyword, at = %self.at(), "keyword is not compiled");
            }
        }
    }

    /// `<document>#<pointer>` of the node being compiled.
    pub(crate) fn at(&self) -> String {
        let doc = self.doc.as_ref().map(ToString::to_string).unwrap_or_default();
        let pointer: String = self.path.iter().map(|s| format!("/{}", escape_pointer(s))).collect();
        format!("{doc}#{pointer}")
    }

    pub(crate) fn unsupported(&self, reason: impl Into<String>) -> CompileError {
        CompileError::UnsupportedSchema { at: self.at(), reason: reason.into() }
    }

    fn unresolved(&self, reference: &str) -> CompileError {
        CompileError::UnresolvedReference { reference: reference.to_string(), at: self.at() }
    }
}

// ------------------------------ Pointers --------------------------------- //

/// `/definitions/<name>` or `/$defs/<name>` → `<name>`.
fn definition_name(fragment: &str) -> Option<String> {
    DEFINITION_KEYS.iter().find_map(|key| {
        let name = fragment.strip_prefix('/')?.strip_prefix(*key)?.strip_prefix('/')?;
        (!name.is_empty() && !name.contains('/')).then(|| unescape_pointer(name))
    })
}

fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

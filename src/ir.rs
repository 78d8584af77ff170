// Compiled type model. Self-contained: every `$ref` has already been replaced
// by the referent's compiled type, so nothing here needs further resolution.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ty {
    Record(Record),
    List { item: Box<Ty> },      // ordered sequence
    Set { item: Box<Ty> },       // `uniqueItems: true`
    OneOf { arms: Vec<Ty> },     // input order preserved; try left to right
    Optional { inner: Box<Ty> }, // field absent from a `required` list
    Leaf { leaf: Leaf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "leaf", content = "value", rename_all = "snake_case")]
pub enum Leaf {
    String,
    Uri,             // `iri` / `iri-reference`
    Number,          // floating point
    Literal(String), // string pinned to a single `const`
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<Field>, // declaration order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: Ty,           // already wrapped in `Optional` when not required
    pub required: bool,
    pub default: FieldDefault,
    pub constraints: Constraints,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// What a field falls back to when an instance leaves it out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "default", content = "value", rename_all = "snake_case")]
pub enum FieldDefault {
    /// No default provided: the field must be supplied.
    Required,
    /// Explicit absence. Not the same thing as a present JSON `null`.
    NoValue,
    Value(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub allowed: Option<Vec<Value>>, // `enum`, enforced downstream
}

impl Ty {
    pub fn leaf(leaf: Leaf) -> Self {
        Ty::Leaf { leaf }
    }

    pub fn list(item: Ty) -> Self {
        Ty::List { item: Box::new(item) }
    }

    pub fn set(item: Ty) -> Self {
        Ty::Set { item: Box::new(item) }
    }

    pub fn optional(inner: Ty) -> Self {
        match inner {
            already @ Ty::Optional { .. } => already,
            inner => Ty::Optional { inner: Box::new(inner) },
        }
    }

    /// The declared type with any optional wrapping removed.
    pub fn base(&self) -> &Ty {
        match self {
            Ty::Optional { inner } => inner.base(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Ty::Optional { .. })
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Ty::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Ty::Leaf { leaf } => Some(leaf),
            _ => None,
        }
    }
}

impl Leaf {
    /// Leaves that accept `minLength` / `maxLength`.
    pub fn is_string_kind(&self) -> bool {
        matches!(self, Leaf::String | Leaf::Uri)
    }
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none() && self.max_length.is_none() && self.allowed.is_none()
    }
}

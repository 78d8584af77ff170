//! Scalar/format resolver: `type` + `format` + `const` → leaf type.
use serde_json::{Map, Value};

use super::Walk;
use crate::error::{CompileError, Result};
use crate::ir::{Leaf, Ty};

const DEFAULT_FORMAT: &str = "default";

/// Every `(type, format)` pair we know how to represent.
const FORMATS: [(&str, &str, Leaf); 4] = [
    ("string", DEFAULT_FORMAT, Leaf::String),
    ("string", "iri", Leaf::Uri),
    ("string", "iri-reference", Leaf::Uri),
    ("number", DEFAULT_FORMAT, Leaf::Number),
];

pub fn lookup_format(ty: &str, format: &str) -> Option<Leaf> {
    FORMATS
        .iter()
        .find(|(t, f, _)| *t == ty && *f == format)
        .map(|(_, _, leaf)| leaf.clone())
}

impl Walk<'_> {
    pub(super) fn resolve_scalar(&self, map: &Map<String, Value>) -> Result<Ty> {
        let ty = match map.get("type") {
            Some(Value::String(ty)) => ty.as_str(),
            Some(_) => return Err(self.unsupported("`type` must be a single type name")),
            None => {
                return Err(self.unsupported(
                    "node has no `type`, `properties`, `$ref` or combinator",
                ));
            }
        };

        if let Some(constant) = map.get("const") {
            if ty != "string" {
                return Err(CompileError::NotImplemented { keyword: "const", at: self.at() });
            }
            let text = match constant {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(Ty::leaf(Leaf::Literal(text)));
        }

        let format = match map.get("format") {
            None => DEFAULT_FORMAT,
            Some(Value::String(format)) => format.as_str(),
            Some(_) => return Err(self.unsupported("`format` must be a string")),
        };
        match lookup_format(ty, format) {
            Some(leaf) => Ok(Ty::leaf(leaf)),
            None => Err(CompileError::UnsupportedFormat {
                ty: ty.to_string(),
                format: format.to_string(),
                at: self.at(),
            }),
        }
    }
}

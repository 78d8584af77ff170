//! Object model builder: `properties` + `required` → record type.
use serde_json::{Map, Value};
use tracing::debug;

use super::Walk;
use crate::error::Result;
use crate::ir::{Constraints, Field, FieldDefault, Leaf, Record, Ty};

// carried by neither the record nor the field yet
const NUMERIC_BOUNDS: [&str; 5] = ["minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum", "multipleOf"];

impl Walk<'_> {
    pub(super) fn compile_object(&mut self, map: &Map<String, Value>) -> Result<Ty> {
        let empty = Map::new();
        let properties = match map.get("properties") {
            None => &empty,
            Some(Value::Object(properties)) => properties,
            Some(_) => return Err(self.unsupported("`properties` must be an object")),
        };
        let required = match map.get("required") {
            None => None,
            Some(Value::Array(names)) => {
                let mut out = Vec::with_capacity(names.len());
                for name in names {
                    match name.as_str() {
                        Some(name) => out.push(name.to_string()),
                        None => return Err(self.unsupported("`required` must list property names")),
                    }
                }
                Some(out)
            }
            Some(_) => return Err(self.unsupported("`required` must be an array")),
        };

        let mut record = self.build_object(properties, required.as_deref())?;
        record.title = text(map.get("title"));
        record.description = text(map.get("description"));
        Ok(Ty::Record(record))
    }

    /// One field per property, in declaration order.
    ///
    /// `required: None` (keyword omitted) makes every field required; with a
    /// list, any property missing from it becomes optional.
    pub(crate) fn build_object(
        &mut self,
        properties: &Map<String, Value>,
        required: Option<&[String]>,
    ) -> Result<Record> {
        let mut fields = Vec::with_capacity(properties.len());
        for (key, property) in properties {
            let field = self.descend(&["properties", key.as_str()], |walk| {
                walk.build_field(key, property, required)
            })?;
            fields.push(field);
        }
        Ok(Record { title: None, description: None, fields })
    }

    fn build_field(
        &mut self,
        key: &str,
        property: &Value,
        required: Option<&[String]>,
    ) -> Result<Field> {
        let base = self.compile_node(property)?;
        let is_required = required.is_none_or(|names| names.iter().any(|name| name == key));
        let constant = property.get("const").cloned();

        let (ty, default) = if is_required {
            let default = constant.map_or(FieldDefault::Required, FieldDefault::Value);
            (base.clone(), default)
        } else {
            let default = constant.map_or(FieldDefault::NoValue, FieldDefault::Value);
            (Ty::optional(base.clone()), default)
        };

        Ok(Field {
            name: key.to_string(),
            ty,
            required: is_required,
            default,
            constraints: self.constraints(property, &base)?,
            title: text(property.get("title")),
            description: text(property.get("description")),
        })
    }

    /// Constraint metadata depends on the resolved (pre-optional) kind.
    fn constraints(&self, property: &Value, base: &Ty) -> Result<Constraints> {
        let mut constraints = Constraints::default();
        match base.as_leaf() {
            Some(leaf) if leaf.is_string_kind() => {
                constraints.min_length = self.length(property, "minLength")?;
                constraints.max_length = self.length(property, "maxLength")?;
            }
            Some(Leaf::Number) => {
                for keyword in NUMERIC_BOUNDS {
                    if property.get(keyword).is_some() {
                        debug!(keyword, at = %self.at(), "numeric bound is not carried");
                    }
                }
            }
            _ => {}
        }
        match property.get("enum") {
            None => {}
            Some(Value::Array(values)) => constraints.allowed = Some(values.clone()),
            Some(_) => return Err(self.unsupported("`enum` must be an array")),
        }
        Ok(constraints)
    }

    fn length(&self, property: &Value, keyword: &str) -> Result<Option<u64>> {
        match property.get(keyword) {
            None => Ok(None),
            Some(value) => match value.as_u64() {
                Some(n) => Ok(Some(n)),
                None => Err(self.unsupported(format!("`{keyword}` must be a non-negative integer"))),
            },
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}

//! Compiled type → Rust source with serde derives.
//!
//! Nested records and unions get their own named items, named after the field
//! that holds them (PascalCase, numeric suffix on collision). Children are
//! written before their parents.
use std::collections::BTreeSet;

use crate::ir::{Field, Leaf, Record, Ty};

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "yield",
];

const DERIVES: &str = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]";

pub struct Codegen {
    out: String,
    taken: BTreeSet<String>,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        let mut out = String::new();
        out.push_str("// Generated by json-model. Do not edit.\n");
        out.push_str("#![allow(dead_code, unused_imports)]\n\n");
        out.push_str("use serde::{Deserialize, Serialize};\n");
        out.push_str("use std::collections::BTreeSet;\n");
        Self { out, taken: BTreeSet::new() }
    }

    /// Emit `ty` as an item called `root` (or a close variant if taken).
    pub fn emit(&mut self, ty: &Ty, root: &str) {
        let name = self.claim(&pascal_case(root));
        match ty {
            Ty::Record(record) => self.emit_record(&name, record),
            Ty::OneOf { arms } => self.emit_union(&name, arms),
            other => {
                let expr = self.type_expr(other, &name);
                self.out.push_str(&format!("\npub type {name} = {expr};\n"));
            }
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn type_expr(&mut self, ty: &Ty, hint: &str) -> String {
        match ty {
            Ty::Record(record) => {
                let name = self.claim(&pascal_case(hint));
                self.emit_record(&name, record);
                name
            }
            Ty::OneOf { arms } => {
                let name = self.claim(&pascal_case(hint));
                self.emit_union(&name, arms);
                name
            }
            Ty::List { item } => format!("Vec<{}>", self.type_expr(item, hint)),
            // only string-shaped elements are `Ord`; the rest stay a Vec
            Ty::Set { item } if is_orderable(item) => format!("BTreeSet<{}>", self.type_expr(item, hint)),
            Ty::Set { item } => format!("Vec<{}>", self.type_expr(item, hint)),
            Ty::Optional { inner } => format!("Option<{}>", self.type_expr(inner, hint)),
            Ty::Leaf { leaf } => match leaf {
                Leaf::String | Leaf::Uri | Leaf::Literal(_) => "String".to_string(),
                Leaf::Number => "f64".to_string(),
            },
        }
    }

    fn emit_record(&mut self, name: &str, record: &Record) {
        let mut body = String::new();
        let mut idents = BTreeSet::new();
        for field in &record.fields {
            let ident = next_free(&mut idents, &field_ident(&field.name), "_");
            body.push_str(&self.field_source(field, &ident));
        }

        let mut item = String::from("\n");
        push_doc(&mut item, "", record.title.as_deref());
        if record.title.is_some() && record.description.is_some() {
            item.push_str("///\n");
        }
        push_doc(&mut item, "", record.description.as_deref());
        item.push_str(DERIVES);
        item.push('\n');
        item.push_str(&format!("pub struct {name} {{\n{body}}}\n"));
        self.out.push_str(&item);
    }

    fn field_source(&mut self, field: &Field, ident: &str) -> String {
        let ty = self.type_expr(&field.ty, &field.name);

        let mut src = String::new();
        push_doc(&mut src, "    ", field.title.as_deref());
        push_doc(&mut src, "    ", field.description.as_deref());
        match field.ty.base() {
            Ty::Leaf { leaf: Leaf::Uri } => src.push_str("    /// format: iri\n"),
            Ty::Leaf { leaf: Leaf::Literal(value) } => {
                src.push_str(&format!("    /// const: {value:?}\n"));
            }
            _ => {}
        }
        if let Some(n) = field.constraints.min_length {
            src.push_str(&format!("    /// minLength: {n}\n"));
        }
        if let Some(n) = field.constraints.max_length {
            src.push_str(&format!("    /// maxLength: {n}\n"));
        }
        if ident != field.name {
            src.push_str(&format!("    #[serde(rename = {:?})]\n", field.name));
        }
        if field.ty.is_optional() {
            src.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
        }
        src.push_str(&format!("    pub {ident}: {ty},\n"));
        src
    }

    fn emit_union(&mut self, name: &str, arms: &[Ty]) {
        let mut variants = String::new();
        for (index, arm) in arms.iter().enumerate() {
            let hint = format!("{name}V{index}");
            let expr = self.type_expr(arm, &hint);
            variants.push_str(&format!("    V{index}({expr}),\n"));
        }
        self.out.push_str(&format!(
            "\n{DERIVES}\n#[serde(untagged)]\npub enum {name} {{\n{variants}}}\n"
        ));
    }

    fn claim(&mut self, base: &str) -> String {
        next_free(&mut self.taken, base, "")
    }
}

/// `base`, or `base{sep}2`, `base{sep}3`... whichever is not taken yet.
fn next_free(taken: &mut BTreeSet<String>, base: &str, sep: &str) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{base}{sep}{n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

fn is_orderable(ty: &Ty) -> bool {
    match ty {
        Ty::Leaf { leaf } => !matches!(leaf, Leaf::Number),
        Ty::List { item } | Ty::Set { item } => is_orderable(item),
        Ty::Optional { inner } => is_orderable(inner),
        Ty::Record(_) | Ty::OneOf { .. } => false,
    }
}

fn push_doc(out: &mut String, indent: &str, text: Option<&str>) {
    let Some(text) = text else { return };
    for line in text.lines() {
        out.push_str(&format!("{indent}/// {line}\n"));
    }
}

fn pascal_case(raw: &str) -> String {
    let mut out = String::new();
    for word in raw.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'T');
    }
    out
}

fn field_ident(raw: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in raw.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if RUST_KEYWORDS.contains(&out.as_str()) {
        out.push('_');
    }
    out
}

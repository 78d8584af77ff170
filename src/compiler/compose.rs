//! Type composer: collections, unions, and record merging for `allOf`.
//!
//! Merging is a join over fields keyed by name:
//! - disjoint fields are carried over untouched, first-seen order
//! - colliding fields must share a base type and intersect their constraints
//! - a field is required if either side requires it
use crate::ir::{Constraints, Field, FieldDefault, Record, Ty};

/// Why two records could not be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub field: String,
    pub reason: String,
}

pub fn collection(item: Ty, unique: bool) -> Ty {
    if unique { Ty::set(item) } else { Ty::list(item) }
}

/// Alternatives keep their input order.
pub fn union(arms: Vec<Ty>) -> Ty {
    Ty::OneOf { arms }
}

pub fn merge(mut acc: Record, next: Record) -> Result<Record, Conflict> {
    acc.title = acc.title.or(next.title);
    acc.description = acc.description.or(next.description);

    for field in next.fields {
        match acc.fields.iter().position(|f| f.name == field.name) {
            None => acc.fields.push(field),
            Some(at) => {
                let earlier = acc.fields.remove(at);
                acc.fields.insert(at, merge_field(earlier, field)?);
            }
        }
    }
    Ok(acc)
}

fn merge_field(a: Field, b: Field) -> Result<Field, Conflict> {
    let conflict = |reason: String| Conflict { field: a.name.clone(), reason };

    if a.ty.base() != b.ty.base() {
        return Err(conflict(format!(
            "incompatible types {:?} and {:?}",
            a.ty.base(),
            b.ty.base()
        )));
    }
    let required = a.required || b.required;
    let base = a.ty.base().clone();
    let ty = if required { base } else { Ty::optional(base) };

    let default = match (a.default.clone(), b.default.clone()) {
        (FieldDefault::Value(x), FieldDefault::Value(y)) if x != y => {
            return Err(conflict(format!("different defaults {x} and {y}")));
        }
        (FieldDefault::Value(x), _) | (_, FieldDefault::Value(x)) => FieldDefault::Value(x),
        _ if required => FieldDefault::Required,
        _ => FieldDefault::NoValue,
    };

    let constraints = intersect(&a.constraints, &b.constraints).map_err(conflict)?;

    Ok(Field {
        name: a.name.clone(),
        ty,
        required,
        default,
        constraints,
        title: a.title.clone().or(b.title),
        description: a.description.clone().or(b.description),
    })
}

fn intersect(a: &Constraints, b: &Constraints) -> Result<Constraints, String> {
    let min_length = a.min_length.max(b.min_length);
    let max_length = match (a.max_length, b.max_length) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    };
    if let (Some(min), Some(max)) = (min_length, max_length) {
        if min > max {
            return Err(format!("minLength {min} exceeds maxLength {max}"));
        }
    }

    let allowed = match (&a.allowed, &b.allowed) {
        (Some(xs), Some(ys)) => {
            let both: Vec<_> = xs.iter().filter(|x| ys.contains(x)).cloned().collect();
            if both.is_empty() {
                return Err("enum values have no overlap".to_string());
            }
            Some(both)
        }
        (xs, ys) => xs.clone().or_else(|| ys.clone()),
    };

    Ok(Constraints { min_length, max_length, allowed })
}

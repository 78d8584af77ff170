//! Definition registry: name → compiled type, one per compile call.
//!
//! Harvested definitions go in as *pending* slots first and are compiled
//! afterwards, so siblings can reference each other in any declaration order.
//! A slot that is referenced while its own body is compiling is a cycle.
//!
//! Nested definition blocks stack up as layers of a [`Scope`]. A definition is
//! always compiled against the layers visible where it was declared, and its
//! result is stored in that same layer.
use indexmap::IndexMap;
use serde_json::Value;

use crate::ir::Ty;
use crate::loader::Location;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    slots: IndexMap<String, Slot>,
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Ready(Ty),
    Pending(PendingDefinition),
    Compiling,
}

/// A declared but not yet compiled definition, with the context it was declared in.
#[derive(Debug, Clone)]
pub(crate) struct PendingDefinition {
    pub node: Value,
    pub base: Option<Location>,
    pub path: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition compiled elsewhere. Document-local definitions with the
    /// same name override it for the duration of a compile call.
    pub fn insert(&mut self, name: impl Into<String>, ty: Ty) {
        self.slots.insert(name.into(), Slot::Ready(ty));
    }

    pub fn with(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.insert(name, ty);
        self
    }

    /// Compiled entries only; pending or in-progress slots are not visible.
    pub fn get(&self, name: &str) -> Option<&Ty> {
        match self.slots.get(name) {
            Some(Slot::Ready(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub(crate) fn declare(&mut self, name: &str, definition: PendingDefinition) {
        self.slots.insert(name.to_string(), Slot::Pending(definition));
    }

    /// Move a pending slot to `Compiling`, handing its body to the caller.
    pub(crate) fn begin(&mut self, name: &str) -> Option<PendingDefinition> {
        let slot = self.slots.get_mut(name)?;
        match std::mem::replace(slot, Slot::Compiling) {
            Slot::Pending(definition) => Some(definition),
            other => {
                *slot = other;
                None
            }
        }
    }

    pub(crate) fn fill(&mut self, name: &str, ty: Ty) {
        self.slots.insert(name.to_string(), Slot::Ready(ty));
    }
}

impl FromIterator<(String, Ty)> for Registry {
    fn from_iter<I: IntoIterator<Item = (String, Ty)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (name, ty) in iter {
            registry.insert(name, ty);
        }
        registry
    }
}

/// Definition blocks in effect at the current node, innermost last.
#[derive(Debug)]
pub(crate) struct Scope {
    layers: Vec<Registry>,
}

impl Scope {
    pub fn new(base: Registry) -> Self {
        Self { layers: vec![base] }
    }

    pub fn push(&mut self, layer: Registry) {
        self.layers.push(layer);
    }

    pub fn pop(&mut self) {
        self.layers.pop();
    }

    /// Innermost slot called `name`, with the index of the layer holding it.
    pub fn lookup(&self, name: &str) -> Option<(usize, &Slot)> {
        self.layers
            .iter()
            .enumerate()
            .rev()
            .find_map(|(layer, registry)| registry.slot(name).map(|slot| (layer, slot)))
    }

    pub fn begin(&mut self, layer: usize, name: &str) -> Option<PendingDefinition> {
        self.layers.get_mut(layer)?.begin(name)
    }

    pub fn fill(&mut self, layer: usize, name: &str, ty: Ty) {
        if let Some(registry) = self.layers.get_mut(layer) {
            registry.fill(name, ty);
        }
    }

    /// Detach every layer above `layer`. Hand them back with [`Scope::restore`].
    pub fn hide_above(&mut self, layer: usize) -> Vec<Registry> {
        self.layers.split_off((layer + 1).min(self.layers.len()))
    }

    pub fn restore(&mut self, hidden: Vec<Registry>) {
        self.layers.extend(hidden);
    }
}

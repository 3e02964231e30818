//! Named lookup over loaded definitions.

use std::collections::BTreeMap;
use std::rc::Rc;

use effects_core::{EffectDefinition, Name};

/// Definitions keyed by name, shared with every spec built from them.
#[derive(Clone, Debug, Default)]
pub struct DefinitionCatalog {
    definitions: BTreeMap<Name, Rc<EffectDefinition>>,
}

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `definition`, returning the one it replaced.
    pub fn insert(&mut self, definition: EffectDefinition) -> Option<Rc<EffectDefinition>> {
        self.definitions
            .insert(definition.name, Rc::new(definition))
    }

    pub fn get(&self, name: &str) -> Option<Rc<EffectDefinition>> {
        self.get_by_name(Name::new(name))
    }

    pub fn get_by_name(&self, name: Name) -> Option<Rc<EffectDefinition>> {
        self.definitions.get(&name).map(Rc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(&Name::new(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<EffectDefinition>> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<EffectDefinition> for DefinitionCatalog {
    fn from_iter<T: IntoIterator<Item = EffectDefinition>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.insert(definition);
        }
        catalog
    }
}

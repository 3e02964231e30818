//! Attribute storage seen by the engine.

use std::collections::HashMap;

use crate::extension::ModCallbackData;
use crate::name::AttributeId;

/// Target-side storage of numeric attributes.
///
/// The pre/post hooks run around every instant write made by an executing
/// effect. Write-backs of an attribute's ongoing total do not call them.
pub trait AttributeHolder {
    fn attribute_value(&self, attribute: AttributeId) -> f64;

    fn set_attribute_value(&mut self, attribute: AttributeId, value: f64);

    /// Instant execution skips attributes the holder does not have.
    fn has_attribute(&self, attribute: AttributeId) -> bool;

    /// May rewrite `data.evaluated` before it is written.
    fn on_attribute_pre_modify(&mut self, _data: &mut ModCallbackData) {}

    fn on_attribute_post_modify(&mut self, _data: &ModCallbackData) {}
}

/// Inclusive clamp applied on every write.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeBounds {
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: Option<f64>,
}

impl AttributeBounds {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Map-backed [`AttributeHolder`] with optional per-attribute bounds.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSet {
    values: HashMap<AttributeId, f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    bounds: HashMap<AttributeId, AttributeBounds>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, attribute: &str, value: f64) -> Self {
        self.insert(AttributeId::new(attribute), value);
        self
    }

    pub fn with_bounds(mut self, attribute: &str, bounds: AttributeBounds) -> Self {
        let attribute = AttributeId::new(attribute);
        self.bounds.insert(attribute, bounds);
        if let Some(value) = self.values.get_mut(&attribute) {
            *value = bounds.apply(*value);
        }
        self
    }

    /// Adds or overwrites an attribute, clamped to its bounds.
    pub fn insert(&mut self, attribute: AttributeId, value: f64) {
        let value = self.clamp(attribute, value);
        self.values.insert(attribute, value);
    }

    pub fn get(&self, attribute: AttributeId) -> Option<f64> {
        self.values.get(&attribute).copied()
    }

    pub fn bounds(&self, attribute: AttributeId) -> Option<&AttributeBounds> {
        self.bounds.get(&attribute)
    }

    /// Attributes sorted by name.
    pub fn sorted(&self) -> Vec<(AttributeId, f64)> {
        let mut values: Vec<(AttributeId, f64)> = self.values.iter().map(|(k, v)| (*k, *v)).collect();
        values.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clamp(&self, attribute: AttributeId, value: f64) -> f64 {
        self.bounds
            .get(&attribute)
            .map_or(value, |bounds| bounds.apply(value))
    }
}

impl AttributeHolder for AttributeSet {
    /// Missing attributes read as `0.0`.
    fn attribute_value(&self, attribute: AttributeId) -> f64 {
        self.get(attribute).unwrap_or(0.0)
    }

    fn set_attribute_value(&mut self, attribute: AttributeId, value: f64) {
        self.insert(attribute, value);
    }

    fn has_attribute(&self, attribute: AttributeId) -> bool {
        self.values.contains_key(&attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_clamped() {
        let health = AttributeId::new("Health");
        let mut set = AttributeSet::new()
            .with_attribute("Health", 100.0)
            .with_bounds("Health", AttributeBounds::new(Some(0.0), Some(100.0)));

        set.set_attribute_value(health, 140.0);
        assert_eq!(set.attribute_value(health), 100.0);
        set.set_attribute_value(health, -20.0);
        assert_eq!(set.attribute_value(health), 0.0);
    }

    #[test]
    fn bounds_clamp_existing_values() {
        let set = AttributeSet::new()
            .with_attribute("Mana", 80.0)
            .with_bounds("Mana", AttributeBounds::new(None, Some(50.0)));
        assert_eq!(set.get(AttributeId::new("Mana")), Some(50.0));
    }

    #[test]
    fn missing_attributes() {
        let set = AttributeSet::new().with_attribute("Health", 1.0);
        let armor = AttributeId::new("Armor");
        assert!(!set.has_attribute(armor));
        assert_eq!(set.attribute_value(armor), 0.0);
        assert_eq!(set.sorted().len(), 1);
    }
}

//! Composition value object
//!
//! A complete mapping from every tracked element to a percentage value.
//! Compositions are only ever built complete; the in-progress form used while
//! collecting user input lives in the bot's collector.

use crate::elements::{Element, ElementSet};
use crate::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Element → percentage mapping covering the whole tracked element set
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    elements: Arc<ElementSet>,
    values: Vec<f64>,
}

impl Composition {
    /// Create a composition from values aligned with `elements`
    ///
    /// # Errors
    /// Returns `InvalidInput` if the value count does not match the element
    /// count or any value is not finite.
    pub fn new(elements: Arc<ElementSet>, values: Vec<f64>) -> Result<Self> {
        if values.len() != elements.len() {
            return Err(Error::InvalidInput(format!(
                "Composition has {} values but {} elements are tracked",
                values.len(),
                elements.len()
            )));
        }

        if let Some((element, value)) = elements
            .iter()
            .zip(values.iter())
            .find(|(_, v)| !v.is_finite())
        {
            return Err(Error::InvalidInput(format!(
                "Non-finite value for {}: {}",
                element, value
            )));
        }

        Ok(Self { elements, values })
    }

    /// Composition with every tracked element set to 0.0
    pub fn zeroed(elements: Arc<ElementSet>) -> Self {
        let values = vec![0.0; elements.len()];
        Self { elements, values }
    }

    /// Build from `(symbol, value)` pairs; unspecified elements are 0.0
    ///
    /// Convenience for tests and tooling.
    pub fn from_pairs(elements: Arc<ElementSet>, pairs: &[(&str, f64)]) -> Result<Self> {
        let mut values = vec![0.0; elements.len()];
        for (symbol, value) in pairs {
            let index = elements.position(symbol).ok_or_else(|| {
                Error::InvalidInput(format!("Element {} is not tracked", symbol))
            })?;
            values[index] = *value;
        }
        Self::new(elements, values)
    }

    pub fn elements(&self) -> &Arc<ElementSet> {
        &self.elements
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Value for an element symbol, `None` if the element is not tracked
    pub fn value(&self, symbol: &str) -> Option<f64> {
        self.elements.position(symbol).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Element, f64)> + '_ {
        self.elements.iter().zip(self.values.iter().copied())
    }

    /// Euclidean distance over the tracked-element vector
    ///
    /// Both compositions must be built over the same element set.
    pub fn euclidean_distance(&self, other: &Composition) -> f64 {
        debug_assert_eq!(self.values.len(), other.values.len());

        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Snapshot keyed by element symbol
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter()
            .map(|(e, v)| (e.symbol().to_string(), v))
            .collect()
    }
}

impl Serialize for Composition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (element, value) in self.iter() {
            map.serialize_entry(element.symbol(), &value)?;
        }
        map.end()
    }
}

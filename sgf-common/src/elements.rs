//! Tracked element set
//!
//! The set of chemical elements every grade record and every composition must
//! declare a value for. The set is declared by the catalog (stored alongside the
//! grades) rather than compiled in, so the bot always works with whatever the
//! last import declared.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element list declared by the original steel grade spreadsheet
pub const DEFAULT_STEEL_ELEMENTS: [&str; 17] = [
    "C", "Si", "Mn", "S", "P", "Cr", "Ni", "Cu", "Mo", "V", "Nb", "Ti", "N", "W", "B", "Co", "Al",
];

/// Chemical element symbol (e.g. `C`, `Mn`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Element(String);

impl Element {
    /// Validate and wrap an element symbol
    ///
    /// Symbols are 1-3 ASCII letters starting with an uppercase letter.
    pub fn new(symbol: impl Into<String>) -> Result<Self> {
        let symbol = symbol.into();
        let trimmed = symbol.trim();

        let valid = !trimmed.is_empty()
            && trimmed.len() <= 3
            && trimmed.chars().all(|c| c.is_ascii_alphabetic())
            && trimmed.chars().next().is_some_and(|c| c.is_ascii_uppercase());

        if !valid {
            return Err(Error::InvalidInput(format!(
                "Invalid element symbol: '{}'",
                symbol
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn symbol(&self) -> &str {
        &self.0
    }

    /// Column holding the lower bound in the import spreadsheet
    pub fn min_column(&self) -> String {
        format!("{}_min", self.0)
    }

    /// Column holding the upper bound in the import spreadsheet
    pub fn max_column(&self) -> String {
        format!("{}_max", self.0)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty set of unique tracked elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    elements: Vec<Element>,
}

impl ElementSet {
    /// Build an element set from symbols, preserving order
    ///
    /// # Errors
    /// Returns `InvalidInput` if the list is empty, contains an invalid
    /// symbol, or contains a duplicate.
    pub fn new<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut elements: Vec<Element> = Vec::new();

        for symbol in symbols {
            let element = Element::new(symbol)?;
            if elements.contains(&element) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate element in tracked set: {}",
                    element
                )));
            }
            elements.push(element);
        }

        if elements.is_empty() {
            return Err(Error::InvalidInput(
                "Tracked element set must not be empty".to_string(),
            ));
        }

        Ok(Self { elements })
    }

    /// The element list declared by the original steel grade spreadsheet
    pub fn default_steel() -> Self {
        Self {
            elements: DEFAULT_STEEL_ELEMENTS
                .iter()
                .map(|s| Element(s.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false for a constructed set; provided for API completeness
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn index_of(&self, element: &Element) -> Option<usize> {
        self.elements.iter().position(|e| e == element)
    }

    /// Look up an element by its symbol (exact, case-sensitive)
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.symbol() == symbol)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.elements.iter().map(|e| e.symbol().to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a ElementSet {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_symbol_validation() {
        assert!(Element::new("C").is_ok());
        assert!(Element::new("Mn").is_ok());
        assert_eq!(Element::new(" Si ").unwrap().symbol(), "Si");

        assert!(Element::new("").is_err());
        assert!(Element::new("mn").is_err());
        assert!(Element::new("C1").is_err());
        assert!(Element::new("Abcd").is_err());
    }

    #[test]
    fn test_column_names() {
        let mn = Element::new("Mn").unwrap();
        assert_eq!(mn.min_column(), "Mn_min");
        assert_eq!(mn.max_column(), "Mn_max");
    }

    #[test]
    fn test_set_preserves_order() {
        let set = ElementSet::new(["Mn", "C", "Si"]).unwrap();
        assert_eq!(set.symbols(), vec!["Mn", "C", "Si"]);
        assert_eq!(set.position("C"), Some(1));
        assert_eq!(set.position("Ni"), None);
    }

    #[test]
    fn test_set_rejects_duplicates_and_empty() {
        assert!(ElementSet::new(["C", "Mn", "C"]).is_err());
        assert!(ElementSet::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_default_steel_set() {
        let set = ElementSet::default_steel();
        assert_eq!(set.len(), 17);
        assert_eq!(set.get(0).map(|e| e.symbol()), Some("C"));
        assert_eq!(set.get(16).map(|e| e.symbol()), Some("Al"));
    }
}

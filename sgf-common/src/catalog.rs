//! Grade catalog model
//!
//! The catalog is loaded once and read-only for the lifetime of the process.
//! Grade order equals load order and is significant: matchers use it as the
//! deterministic tie-break.

use crate::composition::Composition;
use crate::elements::ElementSet;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// How an absent (NULL / empty cell) range bound is interpreted
///
/// `Zero` reproduces the behaviour of the original bot, where a missing
/// bound was read as 0 when computing centroids. It is kept configurable
/// because the metallurgical meaning of a missing bound has not been
/// confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullBoundPolicy {
    /// Absent bound reads as 0.0
    #[default]
    Zero,
    /// Absent min is -inf, absent max is +inf; centroid uses the present bound
    Unbounded,
}

/// Inclusive `[min, max]` range for one element; either bound may be absent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ElementRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// Resolved `(lower, upper)` bounds under `policy`
    pub fn bounds(&self, policy: NullBoundPolicy) -> (f64, f64) {
        match policy {
            NullBoundPolicy::Zero => (self.min.unwrap_or(0.0), self.max.unwrap_or(0.0)),
            NullBoundPolicy::Unbounded => (
                self.min.unwrap_or(f64::NEG_INFINITY),
                self.max.unwrap_or(f64::INFINITY),
            ),
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, value: f64, policy: NullBoundPolicy) -> bool {
        let (lower, upper) = self.bounds(policy);
        lower <= value && value <= upper
    }

    /// Midpoint of the range under `policy`
    pub fn midpoint(&self, policy: NullBoundPolicy) -> f64 {
        match policy {
            NullBoundPolicy::Zero => (self.min.unwrap_or(0.0) + self.max.unwrap_or(0.0)) / 2.0,
            NullBoundPolicy::Unbounded => match (self.min, self.max) {
                (Some(min), Some(max)) => (min + max) / 2.0,
                (Some(bound), None) | (None, Some(bound)) => bound,
                (None, None) => 0.0,
            },
        }
    }
}

/// One catalog grade: name, free-text specification, and a range per element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub name: String,
    pub specification: String,
    /// Ranges aligned with the catalog's element set
    pub ranges: Vec<ElementRange>,
}

impl GradeRecord {
    /// True when every tracked element of `composition` lies in its range
    pub fn contains(&self, composition: &Composition, policy: NullBoundPolicy) -> bool {
        self.ranges
            .iter()
            .zip(composition.values().iter())
            .all(|(range, value)| range.contains(*value, policy))
    }

    /// Per-element midpoint of the declared ranges
    pub fn centroid(&self, elements: &Arc<ElementSet>, policy: NullBoundPolicy) -> Result<Composition> {
        let values = self.ranges.iter().map(|r| r.midpoint(policy)).collect();
        Composition::new(Arc::clone(elements), values)
    }
}

/// Ordered, immutable collection of grade records over one element set
#[derive(Debug, Clone)]
pub struct GradeCatalog {
    elements: Arc<ElementSet>,
    grades: Vec<GradeRecord>,
}

impl GradeCatalog {
    /// Build a catalog, validating every record against the element set
    ///
    /// # Errors
    /// Returns `InvalidInput` if a record's range count differs from the
    /// element count, or if any present `min` exceeds its `max`.
    pub fn new(elements: Arc<ElementSet>, grades: Vec<GradeRecord>) -> Result<Self> {
        for grade in &grades {
            if grade.ranges.len() != elements.len() {
                return Err(Error::InvalidInput(format!(
                    "Grade '{}' declares {} ranges but {} elements are tracked",
                    grade.name,
                    grade.ranges.len(),
                    elements.len()
                )));
            }

            for (element, range) in elements.iter().zip(grade.ranges.iter()) {
                if let (Some(min), Some(max)) = (range.min, range.max) {
                    if min > max {
                        return Err(Error::InvalidInput(format!(
                            "Grade '{}': {} min {} exceeds max {}",
                            grade.name, element, min, max
                        )));
                    }
                }
            }
        }

        Ok(Self { elements, grades })
    }

    /// Catalog with no grades (nearest matching yields no match)
    pub fn empty(elements: Arc<ElementSet>) -> Self {
        Self {
            elements,
            grades: Vec::new(),
        }
    }

    pub fn elements(&self) -> &Arc<ElementSet> {
        &self.elements
    }

    pub fn grades(&self) -> &[GradeRecord] {
        &self.grades
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// `(grade, element)` pairs whose resolved bounds admit no value
    ///
    /// A range such as `min = 0.5` with no max passes validation but is
    /// `[0.5, 0]` under [`NullBoundPolicy::Zero`], so that grade can never
    /// be an exact match.
    pub fn unsatisfiable_ranges(&self, policy: NullBoundPolicy) -> Vec<(&str, &str)> {
        let mut ranges = Vec::new();
        for grade in &self.grades {
            for (element, range) in self.elements.iter().zip(grade.ranges.iter()) {
                let (lower, upper) = range.bounds(policy);
                if lower > upper {
                    ranges.push((grade.name.as_str(), element.symbol()));
                }
            }
        }
        ranges
    }

    /// Log a warning per unsatisfiable range, returning how many were found
    pub fn warn_unsatisfiable_ranges(&self, policy: NullBoundPolicy) -> usize {
        let ranges = self.unsatisfiable_ranges(policy);
        for (grade, symbol) in &ranges {
            warn!(
                grade = %grade,
                element = %symbol,
                ?policy,
                "Range admits no value under the null-bound policy; grade cannot match exactly"
            );
        }
        ranges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Arc<ElementSet> {
        Arc::new(ElementSet::new(["C", "Mn"]).unwrap())
    }

    #[test]
    fn test_zero_policy_reads_missing_bounds_as_zero() {
        let range = ElementRange::new(None, Some(0.25));
        assert_eq!(range.bounds(NullBoundPolicy::Zero), (0.0, 0.25));
        assert!(range.contains(0.0, NullBoundPolicy::Zero));
        assert!(range.contains(0.25, NullBoundPolicy::Zero));
        assert!(!range.contains(0.26, NullBoundPolicy::Zero));
        assert_eq!(range.midpoint(NullBoundPolicy::Zero), 0.125);
    }

    #[test]
    fn test_unbounded_policy_opens_missing_side() {
        let range = ElementRange::new(Some(1.0), None);
        assert!(range.contains(1000.0, NullBoundPolicy::Unbounded));
        assert!(!range.contains(0.5, NullBoundPolicy::Unbounded));
        assert_eq!(range.midpoint(NullBoundPolicy::Unbounded), 1.0);
        assert_eq!(ElementRange::default().midpoint(NullBoundPolicy::Unbounded), 0.0);
    }

    #[test]
    fn test_missing_max_under_zero_policy_only_admits_zero() {
        let range = ElementRange::new(Some(0.0), None);
        assert!(range.contains(0.0, NullBoundPolicy::Zero));
        assert!(!range.contains(0.01, NullBoundPolicy::Zero));
    }

    #[test]
    fn test_catalog_rejects_inverted_range() {
        let grade = GradeRecord {
            name: "BAD".to_string(),
            specification: String::new(),
            ranges: vec![
                ElementRange::new(Some(0.5), Some(0.1)),
                ElementRange::default(),
            ],
        };
        assert!(GradeCatalog::new(elements(), vec![grade]).is_err());
    }

    #[test]
    fn test_missing_max_above_zero_is_unsatisfiable_only_under_zero_policy() {
        let grade = GradeRecord {
            name: "OPEN".to_string(),
            specification: String::new(),
            ranges: vec![
                ElementRange::new(Some(0.1), Some(0.2)),
                ElementRange::new(Some(0.5), None),
            ],
        };
        let catalog = GradeCatalog::new(elements(), vec![grade]).unwrap();

        assert_eq!(
            catalog.unsatisfiable_ranges(NullBoundPolicy::Zero),
            vec![("OPEN", "Mn")]
        );
        assert_eq!(catalog.warn_unsatisfiable_ranges(NullBoundPolicy::Zero), 1);
        assert!(catalog.unsatisfiable_ranges(NullBoundPolicy::Unbounded).is_empty());
    }

    #[test]
    fn test_catalog_rejects_range_count_mismatch() {
        let grade = GradeRecord {
            name: "SHORT".to_string(),
            specification: String::new(),
            ranges: vec![ElementRange::default()],
        };
        assert!(GradeCatalog::new(elements(), vec![grade]).is_err());
    }

    #[test]
    fn test_centroid() {
        let grade = GradeRecord {
            name: "A36".to_string(),
            specification: "ASTM A36".to_string(),
            ranges: vec![
                ElementRange::new(Some(0.0), Some(0.25)),
                ElementRange::new(Some(0.0), Some(1.0)),
            ],
        };
        let centroid = grade.centroid(&elements(), NullBoundPolicy::Zero).unwrap();
        assert_eq!(centroid.values(), &[0.125, 0.5]);
    }
}

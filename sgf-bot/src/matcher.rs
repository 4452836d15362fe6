//! Composition → grade matching
//!
//! **Algorithm:**
//! 1. Range match: every grade whose declared range contains the composition
//!    on every tracked element, in catalog order.
//! 2. If none: nearest match by Euclidean distance between the composition
//!    and each grade's range centroid. Ties go to the earliest grade.
//! 3. Empty catalog: no match (a normal result, not an error).
//!
//! Both steps are linear scans over the catalog; the containment predicate is
//! a pure per-record test.

use serde::Serialize;
use sgf_common::activity::MatchKind;
use sgf_common::{Composition, GradeCatalog, GradeRecord, NullBoundPolicy};
use thiserror::Error;

/// Matching errors
#[derive(Debug, Error)]
pub enum MatchError {
    /// Composition was collected over a different element set than the catalog's
    #[error("Composition elements {composition:?} do not match catalog elements {catalog:?}")]
    ElementSetMismatch {
        composition: Vec<String>,
        catalog: Vec<String>,
    },
}

/// Closest grade when no grade contains the composition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    pub grade: GradeRecord,
    pub centroid: Composition,
    pub distance: f64,
}

/// Outcome of a search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchResult {
    ExactMatches { grades: Vec<GradeRecord> },
    NearestMatch(NearestMatch),
    NoMatch,
}

impl SearchResult {
    pub fn kind(&self) -> MatchKind {
        match self {
            SearchResult::ExactMatches { .. } => MatchKind::Exact,
            SearchResult::NearestMatch(_) => MatchKind::Nearest,
            SearchResult::NoMatch => MatchKind::None,
        }
    }

    /// Names of the grades in the result, in result order
    pub fn grade_names(&self) -> Vec<String> {
        match self {
            SearchResult::ExactMatches { grades } => grades.iter().map(|g| g.name.clone()).collect(),
            SearchResult::NearestMatch(nearest) => vec![nearest.grade.name.clone()],
            SearchResult::NoMatch => Vec::new(),
        }
    }
}

/// Grades whose ranges contain `composition` on every element, in catalog order
pub fn range_match<'a>(
    catalog: &'a GradeCatalog,
    composition: &Composition,
    policy: NullBoundPolicy,
) -> Vec<&'a GradeRecord> {
    catalog
        .grades()
        .iter()
        .filter(|grade| grade.contains(composition, policy))
        .collect()
}

/// Grade with the smallest centroid distance; earliest wins ties
pub fn nearest_match(
    catalog: &GradeCatalog,
    composition: &Composition,
    policy: NullBoundPolicy,
) -> Option<NearestMatch> {
    let mut best: Option<NearestMatch> = None;

    for grade in catalog.grades() {
        let Ok(centroid) = grade.centroid(catalog.elements(), policy) else {
            continue;
        };
        let distance = composition.euclidean_distance(&centroid);

        let closer = best.as_ref().map_or(true, |b| distance < b.distance);
        if closer {
            best = Some(NearestMatch {
                grade: grade.clone(),
                centroid,
                distance,
            });
        }
    }

    best
}

/// Run range matching, falling back to nearest matching on an empty result
pub fn search(
    catalog: &GradeCatalog,
    composition: &Composition,
    policy: NullBoundPolicy,
) -> Result<SearchResult, MatchError> {
    if composition.elements().as_ref() != catalog.elements().as_ref() {
        return Err(MatchError::ElementSetMismatch {
            composition: composition.elements().symbols(),
            catalog: catalog.elements().symbols(),
        });
    }

    let exact = range_match(catalog, composition, policy);
    if !exact.is_empty() {
        return Ok(SearchResult::ExactMatches {
            grades: exact.into_iter().cloned().collect(),
        });
    }

    Ok(match nearest_match(catalog, composition, policy) {
        Some(nearest) => SearchResult::NearestMatch(nearest),
        None => SearchResult::NoMatch,
    })
}

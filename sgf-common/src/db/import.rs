//! Catalog import from a spreadsheet export (CSV)
//!
//! Expected header: `steel_grade`, `specification`, then `<El>_min` and
//! `<El>_max` for every tracked element. Extra columns are ignored.
//!
//! The whole file is read and validated before anything is written; a single
//! bad column or cell rejects the import and leaves the stored catalog as it
//! was. The write itself is one transaction (see [`replace_catalog`]).

use crate::catalog::{ElementRange, GradeCatalog, GradeRecord};
use crate::db::catalog::replace_catalog;
use crate::elements::{Element, ElementSet};
use crate::{Error, Result};
use csv::{ReaderBuilder, StringRecord};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub const NAME_COLUMN: &str = "steel_grade";
pub const SPECIFICATION_COLUMN: &str = "specification";

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub grade_count: usize,
    pub elements: Vec<String>,
}

/// Column positions resolved from the header
struct ColumnLayout {
    name: usize,
    specification: usize,
    /// `(min, max)` column per element, aligned with the element set
    bounds: Vec<(usize, usize)>,
}

/// Read and validate a catalog from CSV data
///
/// `required` fixes the tracked element set; when `None` it is inferred from
/// the `_min`/`_max` header pairs in header order.
pub fn read_catalog<R: Read>(
    reader: R,
    required: Option<&ElementSet>,
    delimiter: u8,
) -> Result<GradeCatalog> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let elements = match required {
        Some(set) => set.clone(),
        None => infer_element_set(&headers)?,
    };
    let layout = resolve_columns(&headers, &elements)?;

    let mut grades = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        grades.push(parse_grade(&record, &layout, &elements, line)?);
    }

    GradeCatalog::new(Arc::new(elements), grades).map_err(|e| Error::Import(e.to_string()))
}

/// Read and validate a catalog from a CSV file
pub fn read_catalog_csv(
    path: &Path,
    required: Option<&ElementSet>,
    delimiter: u8,
) -> Result<GradeCatalog> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::Import(format!("Failed to open {}: {}", path.display(), e))
    })?;
    read_catalog(file, required, delimiter)
}

/// Validate `path` and replace the stored catalog with its contents
pub async fn import_catalog_file(
    pool: &SqlitePool,
    path: &Path,
    required: Option<&ElementSet>,
    delimiter: u8,
) -> Result<ImportReport> {
    let catalog = match read_catalog_csv(path, required, delimiter) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Catalog import rejected, nothing written: {}", e);
            return Err(e);
        }
    };

    if catalog.is_empty() {
        warn!("Importing an empty catalog from {}", path.display());
    }

    replace_catalog(pool, &catalog, &path.display().to_string()).await?;

    let report = ImportReport {
        grade_count: catalog.len(),
        elements: catalog.elements().symbols(),
    };
    info!(
        grades = report.grade_count,
        elements = report.elements.len(),
        "Catalog imported from {}",
        path.display()
    );

    Ok(report)
}

fn infer_element_set(headers: &StringRecord) -> Result<ElementSet> {
    let mut symbols: Vec<String> = Vec::new();

    for header in headers.iter() {
        let symbol = header
            .strip_suffix("_min")
            .or_else(|| header.strip_suffix("_max"));

        if let Some(symbol) = symbol {
            if Element::new(symbol).is_ok() && !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
    }

    if symbols.is_empty() {
        return Err(Error::Import(
            "No <element>_min / <element>_max columns found".to_string(),
        ));
    }

    ElementSet::new(symbols).map_err(|e| Error::Import(e.to_string()))
}

fn resolve_columns(headers: &StringRecord, elements: &ElementSet) -> Result<ColumnLayout> {
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let mut missing: Vec<String> = Vec::new();

    let mut find = |column: String| -> usize {
        match index.get(column.as_str()) {
            Some(i) => *i,
            None => {
                missing.push(column);
                usize::MAX
            }
        }
    };

    let name = find(NAME_COLUMN.to_string());
    let specification = find(SPECIFICATION_COLUMN.to_string());
    let bounds: Vec<(usize, usize)> = elements
        .iter()
        .map(|e| (find(e.min_column()), find(e.max_column())))
        .collect();

    if !missing.is_empty() {
        return Err(Error::Import(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    Ok(ColumnLayout {
        name,
        specification,
        bounds,
    })
}

fn parse_grade(
    record: &StringRecord,
    layout: &ColumnLayout,
    elements: &ElementSet,
    line: u64,
) -> Result<GradeRecord> {
    let cell = |i: usize| record.get(i).unwrap_or("");

    let name = cell(layout.name).to_string();
    if name.is_empty() {
        return Err(Error::Import(format!("Line {}: empty {}", line, NAME_COLUMN)));
    }

    let mut ranges = Vec::with_capacity(layout.bounds.len());
    for (element, (min_col, max_col)) in elements.iter().zip(layout.bounds.iter()) {
        let min = parse_bound(cell(*min_col))
            .map_err(|e| Error::Import(format!("Line {} ({}): {}", line, element.min_column(), e)))?;
        let max = parse_bound(cell(*max_col))
            .map_err(|e| Error::Import(format!("Line {} ({}): {}", line, element.max_column(), e)))?;

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(Error::Import(format!(
                    "Line {}: grade '{}' {} min {} exceeds max {}",
                    line, name, element, lo, hi
                )));
            }
        }

        ranges.push(ElementRange::new(min, max));
    }

    Ok(GradeRecord {
        name,
        specification: cell(layout.specification).to_string(),
        ranges,
    })
}

/// Parse one bound cell; empty means absent, `,` is accepted as decimal separator
fn parse_bound(cell: &str) -> std::result::Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }

    let value: f64 = cell
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("not a number: '{}'", cell))?;

    if !value.is_finite() {
        return Err(format!("not a finite number: '{}'", cell));
    }

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
steel_grade,specification,C_min,C_max,Mn_min,Mn_max,notes
A36,ASTM A36,0,0.25,0,1.0,structural
1020,AISI 1020,0.17,0.23,0.3,0.6,
";

    #[test]
    fn test_infers_elements_from_header() {
        let catalog = read_catalog(CSV.as_bytes(), None, b',').unwrap();
        assert_eq!(catalog.elements().symbols(), vec!["C", "Mn"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.grades()[0].name, "A36");
        assert_eq!(catalog.grades()[1].ranges[0], ElementRange::new(Some(0.17), Some(0.23)));
    }

    #[test]
    fn test_required_elements_reports_all_missing_columns() {
        let required = ElementSet::new(["C", "Mn", "Ni", "Cr"]).unwrap();
        let err = read_catalog(CSV.as_bytes(), Some(&required), b',').unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Ni_min"));
        assert!(message.contains("Ni_max"));
        assert!(message.contains("Cr_min"));
        assert!(message.contains("Cr_max"));
    }

    #[test]
    fn test_unpaired_bound_column_is_missing() {
        let csv = "steel_grade,specification,C_min,C_max,Mn_min\nX,,0,1,0\n";
        let err = read_catalog(csv.as_bytes(), None, b',').unwrap_err();
        assert!(err.to_string().contains("Mn_max"));
    }

    #[test]
    fn test_missing_name_column() {
        let csv = "grade,specification,C_min,C_max\nX,,0,1\n";
        let err = read_catalog(csv.as_bytes(), None, b',').unwrap_err();
        assert!(err.to_string().contains("steel_grade"));
    }

    #[test]
    fn test_empty_cells_are_absent_bounds() {
        let csv = "steel_grade,specification,C_min,C_max\nX,spec,,0.2\n";
        let catalog = read_catalog(csv.as_bytes(), None, b',').unwrap();
        assert_eq!(catalog.grades()[0].ranges[0], ElementRange::new(None, Some(0.2)));
    }

    #[test]
    fn test_semicolon_delimiter_and_decimal_comma() {
        let csv = "steel_grade;specification;C_min;C_max\n08X18H10;GOST 5632;0,05;0,08\n";
        let catalog = read_catalog(csv.as_bytes(), None, b';').unwrap();
        assert_eq!(catalog.grades()[0].ranges[0], ElementRange::new(Some(0.05), Some(0.08)));
    }

    #[test]
    fn test_rejects_non_numeric_cell_with_line() {
        let csv = "steel_grade,specification,C_min,C_max\nA,,0,0.2\nB,,low,0.3\n";
        let err = read_catalog(csv.as_bytes(), None, b',').unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Line 3"), "{}", message);
        assert!(message.contains("C_min"), "{}", message);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let csv = "steel_grade,specification,C_min,C_max\nA,,0.5,0.2\n";
        assert!(matches!(
            read_catalog(csv.as_bytes(), None, b','),
            Err(Error::Import(_))
        ));
    }

    #[test]
    fn test_skips_blank_rows() {
        let csv = "steel_grade,specification,C_min,C_max\nA,,0,0.2\n,,,\n";
        let catalog = read_catalog(csv.as_bytes(), None, b',').unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound(""), Ok(None));
        assert_eq!(parse_bound(" 0.25 "), Ok(Some(0.25)));
        assert_eq!(parse_bound("1,5"), Ok(Some(1.5)));
        assert!(parse_bound("inf").is_err());
        assert!(parse_bound("abc").is_err());
    }
}

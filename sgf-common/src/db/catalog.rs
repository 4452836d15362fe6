//! Catalog load and atomic replace

use crate::catalog::{ElementRange, GradeCatalog, GradeRecord};
use crate::elements::ElementSet;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Load the catalog in stored order
///
/// Returns `None` when no catalog has ever been imported (no element set
/// declared). A grade without a stored range for some element gets an
/// all-absent range for it.
pub async fn load_catalog(pool: &SqlitePool) -> Result<Option<GradeCatalog>> {
    let symbols: Vec<String> =
        sqlx::query_scalar("SELECT symbol FROM catalog_elements ORDER BY position")
            .fetch_all(pool)
            .await?;

    if symbols.is_empty() {
        return Ok(None);
    }

    let elements = Arc::new(ElementSet::new(symbols)?);

    let grade_rows = sqlx::query(
        "SELECT position, steel_grade, specification FROM steel_grades ORDER BY position",
    )
    .fetch_all(pool)
    .await?;

    let mut grades = Vec::with_capacity(grade_rows.len());
    let mut index_by_position: HashMap<i64, usize> = HashMap::with_capacity(grade_rows.len());

    for row in &grade_rows {
        let position: i64 = row.get("position");
        index_by_position.insert(position, grades.len());
        grades.push(GradeRecord {
            name: row.get("steel_grade"),
            specification: row.get("specification"),
            ranges: vec![ElementRange::default(); elements.len()],
        });
    }

    let range_rows =
        sqlx::query("SELECT grade_position, symbol, min_value, max_value FROM grade_ranges")
            .fetch_all(pool)
            .await?;

    for row in &range_rows {
        let position: i64 = row.get("grade_position");
        let symbol: String = row.get("symbol");

        let grade_index = *index_by_position.get(&position).ok_or_else(|| {
            Error::Internal(format!("Range row references missing grade {}", position))
        })?;
        let element_index = elements.position(&symbol).ok_or_else(|| {
            Error::InvalidInput(format!("Range row references untracked element {}", symbol))
        })?;

        grades[grade_index].ranges[element_index] =
            ElementRange::new(row.get("min_value"), row.get("max_value"));
    }

    let catalog = GradeCatalog::new(elements, grades)?;
    debug!(
        grades = catalog.len(),
        elements = catalog.elements().len(),
        "Catalog loaded"
    );

    Ok(Some(catalog))
}

/// Replace the stored catalog with `catalog` in a single transaction
///
/// On any error the transaction is rolled back (dropped uncommitted) and the
/// previous catalog stays in place.
pub async fn replace_catalog(pool: &SqlitePool, catalog: &GradeCatalog, source: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM grade_ranges").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM steel_grades").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM catalog_elements").execute(&mut *tx).await?;

    for (position, element) in catalog.elements().iter().enumerate() {
        sqlx::query("INSERT INTO catalog_elements (position, symbol) VALUES (?, ?)")
            .bind(position as i64)
            .bind(element.symbol())
            .execute(&mut *tx)
            .await?;
    }

    for (position, grade) in catalog.grades().iter().enumerate() {
        sqlx::query(
            "INSERT INTO steel_grades (position, steel_grade, specification) VALUES (?, ?, ?)",
        )
        .bind(position as i64)
        .bind(&grade.name)
        .bind(&grade.specification)
        .execute(&mut *tx)
        .await?;

        for (element, range) in catalog.elements().iter().zip(grade.ranges.iter()) {
            sqlx::query(
                r#"
                INSERT INTO grade_ranges (grade_position, symbol, min_value, max_value)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(element.symbol())
            .bind(range.min)
            .bind(range.max)
            .execute(&mut *tx)
            .await?;
        }
    }

    sqlx::query(
        "INSERT INTO catalog_imports (source, grade_count, element_count) VALUES (?, ?, ?)",
    )
    .bind(source)
    .bind(catalog.len() as i64)
    .bind(catalog.elements().len() as i64)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        grades = catalog.len(),
        elements = catalog.elements().len(),
        source = %source,
        "Catalog replaced"
    );

    Ok(())
}

/// Number of imports recorded in the audit table
pub async fn import_count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM catalog_imports")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

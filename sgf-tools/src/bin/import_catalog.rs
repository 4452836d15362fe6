//! sgf-import - replace the grade catalog from a CSV export
//!
//! The whole file is validated before anything is written; a rejected import
//! leaves the stored catalog untouched and exits non-zero.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use sgf_common::config::TomlConfig;
use sgf_common::db::{import_catalog_file, init_database, load_catalog};
use sgf_common::logging::init_tracing;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sgf-import", version, about = "Import a steel grade catalog from CSV")]
struct Args {
    /// CSV file: steel_grade, specification, <El>_min, <El>_max columns
    csv: PathBuf,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// TOML config file
    #[arg(short, long, env = "SGF_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the catalog database
    #[arg(long, env = "SGF_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;
    info!("sgf-import v{}", env!("CARGO_PKG_VERSION"));

    let delimiter = u8::try_from(args.delimiter)
        .map_err(|_| anyhow!("Delimiter must be a single ASCII character"))?;
    let required = config.catalog.required_elements()?;

    let root_folder = config.resolve_root_folder(args.root_folder.as_deref());
    let db_path = config.database_path(&root_folder);
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open catalog database {}", db_path.display()))?;

    let result = import_catalog_file(&pool, &args.csv, required.as_ref(), delimiter).await;
    let stored = match &result {
        Ok(_) => load_catalog(&pool).await.context("Failed to read back the catalog")?,
        Err(_) => None,
    };
    pool.close().await;

    let report = result.with_context(|| format!("Import of {} failed", args.csv.display()))?;
    let unsatisfiable = stored
        .map(|catalog| catalog.warn_unsatisfiable_ranges(config.catalog.null_bound_policy))
        .unwrap_or(0);
    println!(
        "Imported {} grades over {} elements ({}) into {}",
        report.grade_count,
        report.elements.len(),
        report.elements.join(", "),
        db_path.display()
    );
    if unsatisfiable > 0 {
        println!(
            "{} ranges admit no value under the {:?} null-bound policy (see log)",
            unsatisfiable, config.catalog.null_bound_policy
        );
    }

    Ok(())
}

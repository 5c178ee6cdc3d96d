//! Timestamped CSV/JSON snapshots of a scrape batch.
//!
//! Every run writes fresh files under the results directory, named
//! `<dataset>_<local timestamp>.{csv,json}`, so consecutive runs never
//! clobber each other. An empty batch writes nothing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::extract::ExtractedRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Writes one file per requested format and returns the paths written.
pub fn export(
    records: &[ExtractedRecord],
    dir: &Path,
    dataset: &str,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>, ExportError> {
    if records.is_empty() {
        info!("No records in batch, nothing to save");
        return Ok(Vec::new());
    }
    fs::create_dir_all(dir)?;

    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let mut paths = Vec::new();

    for format in formats {
        let path = match format {
            ExportFormat::Csv => {
                let path = dir.join(format!("{dataset}_{stamp}.csv"));
                write_csv(records, &path)?;
                path
            }
            ExportFormat::Json => {
                let path = dir.join(format!("{dataset}_{stamp}.json"));
                write_json(records, &path)?;
                path
            }
        };
        info!(path = %path.display(), records = records.len(), "Exported batch");
        paths.push(path);
    }

    Ok(paths)
}

fn write_csv(records: &[ExtractedRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    // Header comes from the first record; all records in a batch share
    // the same field spec so the column sets agree.
    let header: Vec<String> = records[0]
        .columns()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    writer.write_record(&header)?;

    for record in records {
        let row: Vec<String> = record.columns().into_iter().map(|(_, v)| v).collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(records: &[ExtractedRecord], path: &Path) -> Result<(), ExportError> {
    let array: Vec<BTreeMap<String, String>> = records
        .iter()
        .map(|record| record.columns().into_iter().collect())
        .collect();
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &array)?;
    Ok(())
}

// spreadsheets/csv_table.rs
//
// Delimited tables are UTF-8 with a leading byte-order mark so that
// spreadsheet tools pick the right encoding for the Chinese text fields.
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::errors::StoreError;
use crate::features::{Cell, FeatureMatrix, RawTable};

const BOM: &str = "\u{feff}";

fn create_with_bom(path: &Path) -> Result<csv::Writer<File>, StoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = File::create(path)?;
    file.write_all(BOM.as_bytes())?;
    Ok(csv::Writer::from_writer(file))
}

pub fn write_table_csv(table: &RawTable, path: &Path) -> Result<(), StoreError> {
    let mut w = create_with_bom(path)?;
    w.write_record(&table.columns)?;
    for row in &table.rows {
        w.write_record(row.iter().map(Cell::render))?;
    }
    w.flush()?;
    tracing::info!(path = %path.display(), rows = table.n_rows(), "table written");
    Ok(())
}

/// NaN cells are written empty.
pub fn write_matrix_csv(matrix: &FeatureMatrix, path: &Path) -> Result<(), StoreError> {
    let mut w = create_with_bom(path)?;
    w.write_record(&matrix.columns)?;
    for row in &matrix.rows {
        w.write_record(row.iter().map(|v| {
            if v.is_nan() {
                String::new()
            } else {
                v.to_string()
            }
        }))?;
    }
    w.flush()?;
    tracing::info!(path = %path.display(), rows = matrix.n_rows(), "matrix written");
    Ok(())
}

/// Loads a table written by [`write_table_csv`] or any headed CSV.
/// A leading BOM is ignored and the usual NA markers read as missing.
pub fn read_table_csv(path: &Path) -> Result<RawTable, StoreError> {
    let text = fs::read_to_string(path)?;
    let text = text.strip_prefix(BOM).unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }
    Ok(table)
}

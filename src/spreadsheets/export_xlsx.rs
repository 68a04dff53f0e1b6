use crate::errors::StoreError;
use crate::features::FeatureMatrix;
use rust_xlsxwriter::Workbook;
use std::path::Path;

pub fn export_matrix_xlsx(matrix: &FeatureMatrix, path: &Path) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    // Headers
    for (col, header) in matrix.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header.as_str())
            .map_err(|e| {
                StoreError::Xlsx(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows. NaN has no spreadsheet representation and is left blank.
    for (i, row) in matrix.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            worksheet
                .write_number(r, col as u16, *value)
                .map_err(|e| {
                    StoreError::Xlsx(format!(
                        "Failed to write {} at row {}: {}",
                        matrix.columns[col], r, e
                    ))
                })?;
        }
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    workbook
        .save(path)
        .map_err(|e| StoreError::Xlsx(format!("Failed to save workbook: {}", e)))?;

    tracing::info!(path = %path.display(), rows = matrix.n_rows(), "matrix exported to xlsx");
    Ok(())
}

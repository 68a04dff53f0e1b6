pub mod csv_table;
pub mod export_xlsx;

pub use csv_table::{read_table_csv, write_matrix_csv, write_table_csv};
pub use export_xlsx::export_matrix_xlsx;

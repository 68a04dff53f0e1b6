/// Statistics fitted on one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericStats {
    pub column: String,
    pub mean: f64,
    /// 1.0 for pass-through columns and constant columns.
    pub scale: f64,
}

/// Fill value and code table fitted on one categorical column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    pub column: String,
    pub fill: Option<String>,
    /// Index in this list is the code.
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStats {
    pub numeric: Vec<NumericStats>,
    pub categorical: Vec<CategoryTable>,
}

/// Model-ready numeric table: scaled numeric block, pass-through block,
/// encoded categorical block, log-target block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub stats: ColumnStats,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }
}

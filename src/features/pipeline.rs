// features/pipeline.rs
use std::path::PathBuf;

use crate::config::City;
use crate::errors::{ConfigError, Result};
use crate::features::matrix::{CategoryTable, ColumnStats, FeatureMatrix, NumericStats};
use crate::features::table::{Cell, RawTable};
use crate::features::transforms;
use crate::geo::{haversine_km, Coordinate};
use crate::spreadsheets;

pub const DISTANCE_COLUMN: &str = "distance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetVariant {
    /// Listings crawled from the 58.com second-hand housing pages.
    City58,
    /// The house-prices regression dataset used in the paper.
    Paper,
}

impl DatasetVariant {
    pub fn name(self) -> &'static str {
        match self {
            DatasetVariant::City58 => "city58",
            DatasetVariant::Paper => "paper",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPartition {
    Explicit {
        /// Mean-imputed, then standardized.
        numeric: Vec<String>,
        /// Mean-imputed only.
        passthrough: Vec<String>,
        categorical: Vec<String>,
    },
    /// Numeric iff every present cell is a number and the column has a gap
    /// or a fractional value; everything else that survives the drop step
    /// is categorical.
    Inferred,
}

/// Where and how to materialize the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistTarget {
    pub dir: PathBuf,
    pub file_stem: String,
    pub xlsx: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub variant: DatasetVariant,
    pub drop: Vec<String>,
    /// Columns where a gap means "none" rather than "unknown".
    pub absent_token_columns: Vec<String>,
    pub absent_token: String,
    pub partition: ColumnPartition,
    pub targets: Vec<String>,
    /// Also drop any column whose most common value (missing included)
    /// covers at least this share of rows.
    pub dominance_threshold: Option<f64>,
    pub city: Option<City>,
    pub persist: Option<PersistTarget>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    pub fn city58(city: Option<City>) -> Self {
        Self {
            variant: DatasetVariant::City58,
            drop: names(&["ID", "houseLoc", "housePrice"]),
            absent_token_columns: names(&["houseHousingPeriod"]),
            absent_token: "None".to_string(),
            partition: ColumnPartition::Explicit {
                numeric: names(&[
                    "longitude",
                    "latitude",
                    "houseArea",
                    "houseBedroom",
                    "houseLivingRoom",
                    "houseBathroom",
                    "houseAge",
                    "houseFloorSum",
                    "schoolAround",
                    "subwayAround",
                    "parkAround",
                    "shopping_mallAround",
                    "busAround",
                ]),
                passthrough: names(&[DISTANCE_COLUMN]),
                categorical: names(&[
                    "houseOrientation",
                    "houseSubway",
                    "houseHousingPeriod",
                    "houseFloorType",
                ]),
            },
            targets: names(&["unitPrice"]),
            dominance_threshold: None,
            city,
            persist: None,
        }
    }

    pub fn paper() -> Self {
        Self {
            variant: DatasetVariant::Paper,
            drop: names(&["Id"]),
            absent_token_columns: names(&[
                "Alley",
                "BsmtQual",
                "BsmtCond",
                "BsmtExposure",
                "BsmtFinType1",
                "BsmtFinType2",
                "FireplaceQu",
                "GarageType",
                "GarageFinish",
                "GarageQual",
                "GarageCond",
                "PoolQC",
                "Fence",
                "MiscFeature",
            ]),
            absent_token: "None".to_string(),
            partition: ColumnPartition::Inferred,
            targets: names(&["SalePrice"]),
            dominance_threshold: Some(0.9),
            city: None,
            persist: None,
        }
    }

    pub fn with_persist(mut self, target: PersistTarget) -> Self {
        self.persist = Some(target);
        self
    }
}

pub struct FeaturePipeline {
    cfg: PipelineConfig,
}

impl FeaturePipeline {
    /// Fails fast when the variant needs a city and none was given.
    pub fn new(cfg: PipelineConfig) -> std::result::Result<Self, ConfigError> {
        if cfg.variant == DatasetVariant::City58 && cfg.city.is_none() {
            return Err(ConfigError::MissingCityName(cfg.variant.name().to_string()));
        }
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Clean, impute, encode, scale. Statistics are fitted on `input` alone.
    pub fn build(&self, input: &RawTable) -> Result<FeatureMatrix> {
        let mut table = input.clone();

        if let Some(city) = &self.cfg.city {
            let distances = distance_to_center(&table, city.center)?;
            table.set_column(DISTANCE_COLUMN, distances);
        }

        for name in &self.cfg.absent_token_columns {
            if let Some(cells) = table.column_mut(name) {
                for cell in cells.filter(|c| c.is_missing()) {
                    *cell = Cell::Text(self.cfg.absent_token.clone());
                }
            }
        }

        table.drop_columns(self.cfg.drop.as_slice());
        if let Some(threshold) = self.cfg.dominance_threshold {
            let dominated = dominated_columns(&table, threshold, &self.cfg.targets);
            if !dominated.is_empty() {
                tracing::debug!(?dominated, "dropping near-constant columns");
            }
            table.drop_columns(dominated.as_slice());
        }

        let (numeric, passthrough, categorical) = self.partition(&table)?;
        for target in &self.cfg.targets {
            require(&table, target)?;
        }

        let mut blocks: Vec<(String, Vec<f64>)> = Vec::new();
        let mut stats = ColumnStats::default();

        for name in &numeric {
            let (filled, _) = transforms::mean_impute(&numbers(&table, name));
            let (scaled, mean, scale) = transforms::standardize(&filled);
            stats.numeric.push(NumericStats {
                column: name.clone(),
                mean,
                scale,
            });
            blocks.push((name.clone(), scaled));
        }

        for name in &passthrough {
            let (filled, mean) = transforms::mean_impute(&numbers(&table, name));
            stats.numeric.push(NumericStats {
                column: name.clone(),
                mean,
                scale: 1.0,
            });
            blocks.push((name.clone(), filled));
        }

        for name in &categorical {
            let raw = categories(&table, name);
            let fill = transforms::most_frequent(&raw);
            let filled: Vec<String> = raw
                .into_iter()
                .map(|v| v.or_else(|| fill.clone()).unwrap_or_default())
                .collect();
            let (codes, cats) = transforms::ordinal_encode(&filled);
            stats.categorical.push(CategoryTable {
                column: name.clone(),
                fill,
                categories: cats,
            });
            blocks.push((name.clone(), codes));
        }

        for name in &self.cfg.targets {
            let values = numbers(&table, name);
            let missing = values.iter().filter(|v| v.is_none()).count();
            if missing > 0 {
                tracing::warn!(column = %name, missing, "target has gaps; log leaves NaN");
            }
            blocks.push((name.clone(), transforms::log_transform(&values)));
        }

        let n = table.n_rows();
        let rows = (0..n)
            .map(|i| blocks.iter().map(|(_, col)| col[i]).collect())
            .collect();
        let matrix = FeatureMatrix {
            columns: blocks.into_iter().map(|(name, _)| name).collect(),
            rows,
            stats,
        };

        tracing::info!(
            variant = self.cfg.variant.name(),
            rows = matrix.n_rows(),
            cols = matrix.n_cols(),
            "feature matrix built"
        );

        if let Some(target) = &self.cfg.persist {
            let path = target.dir.join(format!("{}.csv", target.file_stem));
            spreadsheets::write_matrix_csv(&matrix, &path)?;
            if target.xlsx {
                let path = target.dir.join(format!("{}.xlsx", target.file_stem));
                spreadsheets::export_matrix_xlsx(&matrix, &path)?;
            }
        }

        Ok(matrix)
    }

    fn partition(
        &self,
        table: &RawTable,
    ) -> std::result::Result<(Vec<String>, Vec<String>, Vec<String>), ConfigError> {
        match &self.cfg.partition {
            ColumnPartition::Explicit {
                numeric,
                passthrough,
                categorical,
            } => {
                for name in numeric.iter().chain(passthrough).chain(categorical) {
                    require(table, name)?;
                }
                Ok((numeric.clone(), passthrough.clone(), categorical.clone()))
            }
            ColumnPartition::Inferred => {
                let mut numeric = Vec::new();
                let mut categorical = Vec::new();
                for (idx, name) in table.columns.iter().enumerate() {
                    if self.cfg.targets.contains(name) {
                        continue;
                    }
                    if is_float_column(table, idx) {
                        numeric.push(name.clone());
                    } else {
                        categorical.push(name.clone());
                    }
                }
                Ok((numeric, Vec::new(), categorical))
            }
        }
    }
}

/// A column is continuous when every present cell is a number and it has
/// a gap or a fractional value. Gap-free whole-number columns are codes
/// and go to the categorical block.
fn is_float_column(table: &RawTable, idx: usize) -> bool {
    let mut has_gap = false;
    let mut has_fraction = false;
    for row in &table.rows {
        match &row[idx] {
            Cell::Number(v) => has_fraction |= v.fract() != 0.0,
            Cell::Missing => has_gap = true,
            Cell::Text(_) => return false,
        }
    }
    has_gap || has_fraction
}

fn require(table: &RawTable, name: &str) -> std::result::Result<(), ConfigError> {
    table
        .column_index(name)
        .map(|_| ())
        .ok_or_else(|| ConfigError::MissingColumn(name.to_string()))
}

fn numbers(table: &RawTable, name: &str) -> Vec<Option<f64>> {
    table
        .column(name)
        .map(|cells| cells.into_iter().map(Cell::as_number).collect())
        .unwrap_or_default()
}

fn categories(table: &RawTable, name: &str) -> Vec<Option<String>> {
    table
        .column(name)
        .map(|cells| cells.into_iter().map(Cell::as_category).collect())
        .unwrap_or_default()
}

/// Haversine km from each row's longitude/latitude to `center`.
fn distance_to_center(
    table: &RawTable,
    center: Coordinate,
) -> std::result::Result<Vec<Cell>, ConfigError> {
    require(table, "longitude")?;
    require(table, "latitude")?;
    let lngs = numbers(table, "longitude");
    let lats = numbers(table, "latitude");
    Ok(lngs
        .into_iter()
        .zip(lats)
        .map(|(lng, lat)| match (lng, lat) {
            (Some(lng), Some(lat)) => Cell::Number(haversine_km(Coordinate::new(lng, lat), center)),
            _ => Cell::Missing,
        })
        .collect())
}

fn dominated_columns(table: &RawTable, threshold: f64, keep: &[String]) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|name| !keep.contains(*name))
        .filter(|name| transforms::dominant_share(&categories(table, name)) >= threshold)
        .cloned()
        .collect()
}

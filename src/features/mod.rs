pub mod matrix;
pub mod pipeline;
pub mod table;
pub mod transforms;

pub use matrix::{CategoryTable, ColumnStats, FeatureMatrix, NumericStats};
pub use pipeline::{
    ColumnPartition, DatasetVariant, FeaturePipeline, PersistTarget, PipelineConfig,
    DISTANCE_COLUMN,
};
pub use table::{Cell, RawTable, SIMPLE_TABLE_HEADER, TABLE_HEADER};

//! Error types shared by the inflow graph engine and its I/O layer.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Error, Debug)]
pub enum FlowError {
    /// A value that is not one of the eight D8 codes was passed to the codec.
    #[error("invalid D8 flow code: {code}")]
    InvalidCode { code: i64 },

    /// A raster cell holds neither a D8 code nor the no-data sentinel.
    #[error("invalid flow direction {value} at cell ({row}, {col})")]
    InvalidRasterCode { row: usize, col: usize, value: f64 },

    /// The no-data sentinel is itself a D8 code and would be read as flow.
    #[error("no-data value {no_data} collides with a D8 flow code")]
    NoDataCollision { no_data: i32 },

    /// A cell coordinate lies outside the raster extent.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} raster")]
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },

    #[error("raster data has {found} cells, expected {rows}x{cols}")]
    DimensionMismatch { rows: usize, cols: usize, found: usize },

    #[error("domain mask is {mask_rows}x{mask_cols} but raster is {rows}x{cols}")]
    MaskShapeMismatch {
        rows: usize,
        cols: usize,
        mask_rows: usize,
        mask_cols: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

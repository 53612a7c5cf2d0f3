//! JSON raster input and inflow graph export.
//!
//! The raster file carries its shape, the row-major flow codes (as numbers,
//! so float rasters exported from GIS tools load unchanged), an optional
//! no-data value and an optional domain mask:
//!
//! ```json
//! { "rows": 2, "cols": 2, "no_data": -9999,
//!   "codes": [4, 4, 1, -9999],
//!   "mask": [true, true, true, false] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FlowResult;
use crate::flow::{DomainMask, FlowDirectionRaster, InflowGraph, NO_DATA};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterFile {
    pub rows: usize,
    pub cols: usize,
    #[serde(default = "default_no_data")]
    pub no_data: f64,
    pub codes: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,
}

fn default_no_data() -> f64 {
    NO_DATA as f64
}

/// A validated raster and its domain mask, if the file had one.
#[derive(Debug)]
pub struct LoadedRaster {
    pub raster: FlowDirectionRaster,
    pub mask: Option<DomainMask>,
}

impl RasterFile {
    pub fn from_raster(raster: &FlowDirectionRaster, mask: Option<&DomainMask>) -> Self {
        let mask = mask.map(|m| {
            (0..raster.rows())
                .flat_map(|row| (0..raster.cols()).map(move |col| (row, col)))
                .map(|(row, col)| m.contains(row, col))
                .collect()
        });

        Self {
            rows: raster.rows(),
            cols: raster.cols(),
            no_data: raster.no_data() as f64,
            codes: raster.codes().as_slice().iter().map(|&c| c as f64).collect(),
            mask,
        }
    }

    /// Validate the contents into a raster and optional mask.
    pub fn into_raster(self) -> FlowResult<LoadedRaster> {
        let raster = FlowDirectionRaster::from_f64(self.rows, self.cols, &self.codes, self.no_data)?;
        let mask = match self.mask {
            Some(cells) => Some(DomainMask::from_cells(self.rows, self.cols, cells)?),
            None => None,
        };
        Ok(LoadedRaster { raster, mask })
    }
}

pub fn parse_raster(json: &str) -> FlowResult<LoadedRaster> {
    let file: RasterFile = serde_json::from_str(json)?;
    file.into_raster()
}

pub fn load_raster(path: &Path) -> FlowResult<LoadedRaster> {
    let text = fs::read_to_string(path)?;
    parse_raster(&text)
}

/// Write the graph's JSON form (cells with at least one inflow).
pub fn write_graph(graph: &InflowGraph, path: &Path) -> FlowResult<()> {
    let json = serde_json::to_string_pretty(graph)?;
    fs::write(path, json)?;
    Ok(())
}

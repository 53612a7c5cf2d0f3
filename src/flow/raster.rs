//! Validated single-flow-direction raster.
//!
//! Every cell holds exactly one D8 code or the raster's no-data sentinel.
//! Validation happens once, at construction, so the inflow builder never
//! sees a combined or out-of-range code.

use crate::error::{FlowError, FlowResult};
use crate::flow::direction::Octant;
use crate::tilemap::Tilemap;

/// No-data value used by the GIS preprocessing stage.
pub const NO_DATA: i32 = -9999;

#[derive(Clone, Debug, PartialEq)]
pub struct FlowDirectionRaster {
    codes: Tilemap<i32>,
    no_data: i32,
}

impl FlowDirectionRaster {
    /// Build a raster from row-major codes, rejecting anything that is not
    /// a D8 code or `no_data`.
    pub fn from_codes(rows: usize, cols: usize, codes: Vec<i32>, no_data: i32) -> FlowResult<Self> {
        if Octant::is_valid_code(no_data) {
            return Err(FlowError::NoDataCollision { no_data });
        }
        let found = codes.len();
        let codes = Tilemap::from_vec(rows, cols, codes)
            .ok_or(FlowError::DimensionMismatch { rows, cols, found })?;

        for (row, col, &code) in codes.iter() {
            if code != no_data && !Octant::is_valid_code(code) {
                return Err(FlowError::InvalidRasterCode { row, col, value: code as f64 });
            }
        }

        Ok(Self { codes, no_data })
    }

    /// Build from a float raster as exported by GIS tools.
    /// `NaN` and `no_data` become the sentinel; other values must be
    /// integral D8 codes.
    pub fn from_f64(rows: usize, cols: usize, values: &[f64], no_data: f64) -> FlowResult<Self> {
        if no_data.fract() == 0.0 && Octant::is_valid_code(no_data as i32) {
            return Err(FlowError::NoDataCollision { no_data: no_data as i32 });
        }
        if values.len() != rows * cols {
            return Err(FlowError::DimensionMismatch { rows, cols, found: values.len() });
        }

        let mut codes = Vec::with_capacity(values.len());
        for (idx, &value) in values.iter().enumerate() {
            if value.is_nan() || value == no_data {
                codes.push(NO_DATA);
                continue;
            }
            let code = value as i32;
            if value.fract() != 0.0 || !Octant::is_valid_code(code) {
                return Err(FlowError::InvalidRasterCode {
                    row: idx / cols,
                    col: idx % cols,
                    value,
                });
            }
            codes.push(code);
        }

        Self::from_codes(rows, cols, codes, NO_DATA)
    }

    /// Every cell drains the same way, e.g. a planar hillslope.
    pub fn uniform(rows: usize, cols: usize, code: i32) -> FlowResult<Self> {
        Octant::from_code(code)?;
        Ok(Self {
            codes: Tilemap::new_with(rows, cols, code),
            no_data: NO_DATA,
        })
    }

    pub fn rows(&self) -> usize {
        self.codes.rows
    }

    pub fn cols(&self) -> usize {
        self.codes.cols
    }

    pub fn cell_count(&self) -> usize {
        self.codes.len()
    }

    pub fn no_data(&self) -> i32 {
        self.no_data
    }

    /// Code stored at `(row, col)`; `None` outside the raster.
    pub fn code(&self, row: usize, col: usize) -> Option<i32> {
        self.codes.try_get(row, col).copied()
    }

    /// Whether the cell holds the sentinel. Cells off the raster do not.
    pub fn is_no_data(&self, row: usize, col: usize) -> bool {
        self.code(row, col) == Some(self.no_data)
    }

    /// Direction the cell drains towards, `None` for no-data cells and
    /// coordinates off the raster.
    pub fn outflow(&self, row: usize, col: usize) -> Option<Octant> {
        Octant::from_code(self.code(row, col)?).ok()
    }

    /// Cell this one drains into, if it lies inside the raster.
    pub fn downstream(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let (drow, dcol) = self.outflow(row, col)?.delta();
        self.codes.offset_coord(row, col, drow, dcol)
    }

    pub fn codes(&self) -> &Tilemap<i32> {
        &self.codes
    }

    /// Change the code of one cell, keeping the raster valid.
    pub fn set_code(&mut self, row: usize, col: usize, code: i32) -> FlowResult<()> {
        if !self.codes.contains(row, col) {
            return Err(FlowError::OutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        if code != self.no_data {
            Octant::from_code(code)?;
        }
        self.codes.set(row, col, code);
        Ok(())
    }
}

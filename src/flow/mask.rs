//! Computational domain mask.
//!
//! Cells outside the domain get no inflow list of their own and never
//! count as an inflow source for their neighbors. The mask is always
//! passed explicitly alongside the raster it belongs to.

use crate::error::{FlowError, FlowResult};
use crate::flow::raster::FlowDirectionRaster;
use crate::tilemap::Tilemap;

#[derive(Clone, Debug, PartialEq)]
pub struct DomainMask {
    cells: Tilemap<bool>,
}

impl DomainMask {
    /// Every cell is inside the domain.
    pub fn full(rows: usize, cols: usize) -> Self {
        Self { cells: Tilemap::new_with(rows, cols, true) }
    }

    /// Domain made of every cell that is not no-data.
    pub fn from_no_data(raster: &FlowDirectionRaster) -> Self {
        Self {
            cells: raster.codes().map(|&code| code != raster.no_data()),
        }
    }

    /// Row-major membership flags.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<bool>) -> FlowResult<Self> {
        let found = cells.len();
        let cells = Tilemap::from_vec(rows, cols, cells)
            .ok_or(FlowError::DimensionMismatch { rows, cols, found })?;
        Ok(Self { cells })
    }

    pub fn rows(&self) -> usize {
        self.cells.rows
    }

    pub fn cols(&self) -> usize {
        self.cells.cols
    }

    /// `false` for excluded cells and for anything off the grid.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.try_get(row, col).copied().unwrap_or(false)
    }

    pub fn exclude(&mut self, row: usize, col: usize) {
        if self.cells.contains(row, col) {
            self.cells.set(row, col, false);
        }
    }

    /// Domain cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().filter(|(_, _, inside)| **inside).map(|(r, c, _)| (r, c))
    }

    pub fn count(&self) -> usize {
        self.cells.as_slice().iter().filter(|&&inside| inside).count()
    }

    pub(crate) fn check_shape(&self, raster: &FlowDirectionRaster) -> FlowResult<()> {
        if self.rows() != raster.rows() || self.cols() != raster.cols() {
            return Err(FlowError::MaskShapeMismatch {
                rows: raster.rows(),
                cols: raster.cols(),
                mask_rows: self.rows(),
                mask_cols: self.cols(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::raster::NO_DATA;

    #[test]
    fn test_from_no_data_excludes_sentinel_cells() {
        let raster = FlowDirectionRaster::from_codes(2, 2, vec![4, NO_DATA, 4, 4], NO_DATA).unwrap();
        let mask = DomainMask::from_no_data(&raster);
        assert!(mask.contains(0, 0));
        assert!(!mask.contains(0, 1));
        assert_eq!(mask.count(), 3);
        assert_eq!(mask.cells().collect::<Vec<_>>(), vec![(0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_contains_is_false_off_grid() {
        let mask = DomainMask::full(2, 2);
        assert!(!mask.contains(2, 0));
        assert!(!mask.contains(0, 5));
    }

    #[test]
    fn test_exclude_ignores_off_grid() {
        let mut mask = DomainMask::full(1, 2);
        mask.exclude(0, 1);
        mask.exclude(4, 4);
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        let raster = FlowDirectionRaster::uniform(3, 2, 4).unwrap();
        let mask = DomainMask::full(2, 3);
        assert!(matches!(
            mask.check_shape(&raster),
            Err(FlowError::MaskShapeMismatch { rows: 3, cols: 2, mask_rows: 2, mask_cols: 3 })
        ));
        assert!(DomainMask::from_cells(2, 2, vec![true; 3]).is_err());
    }
}

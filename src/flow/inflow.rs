//! Inflow graph construction.
//!
//! For every cell the builder probes the eight neighbor positions of
//! [`OCTANT_TABLE`] and records the neighbors whose own flow code points
//! back at the cell. Matches are summed into an inflow mask, which is then
//! decoded into an ordered offset list. Probes that leave the raster or
//! the computational domain read as "no inflow".
//!
//! The result is stored in compressed sparse row form: `cell_offsets[i]`
//! is the start of cell `i`'s sources in `sources`, and
//! `cell_offsets[i + 1] - cell_offsets[i]` is its in-degree.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::error::FlowResult;
use crate::flow::direction::{decompose, Octant, OctantEntry, Offset, OCTANT_TABLE};
use crate::flow::mask::DomainMask;
use crate::flow::params::BuildParams;
use crate::flow::raster::FlowDirectionRaster;
use crate::tilemap::Tilemap;

/// Raster paired with the domain it is routed over.
#[derive(Clone, Copy)]
struct Domain<'a> {
    raster: &'a FlowDirectionRaster,
    mask: Option<&'a DomainMask>,
}

impl<'a> Domain<'a> {
    fn contains(&self, row: usize, col: usize) -> bool {
        row < self.raster.rows()
            && col < self.raster.cols()
            && self.mask.map_or(true, |m| m.contains(row, col))
    }

    /// Code of the neighbor in `entry`'s position, if it is part of the domain.
    fn probe(&self, row: usize, col: usize, entry: &OctantEntry) -> Option<i32> {
        let (drow, dcol) = entry.offset;
        let (r, c) = self.raster.codes().offset_coord(row, col, drow, dcol)?;
        if let Some(mask) = self.mask {
            if !mask.contains(r, c) {
                return None;
            }
        }
        self.raster.code(r, c)
    }

    fn drains_into(&self, row: usize, col: usize, entry: &OctantEntry) -> bool {
        self.probe(row, col, entry) == Some(entry.inflow_code as i32)
    }

    fn inflow_mask(&self, row: usize, col: usize) -> u8 {
        if !self.contains(row, col) {
            return 0;
        }

        let mut mask = 0u8;
        for entry in OCTANT_TABLE.iter() {
            if self.drains_into(row, col, entry) {
                mask += entry.inflow_code;
            }
        }
        mask
    }

    fn indicator(&self, row: usize, col: usize) -> OctantIndicator {
        let mut slots = [false; 8];
        if self.contains(row, col) {
            for (slot, entry) in OCTANT_TABLE.iter().enumerate() {
                slots[slot] = self.drains_into(row, col, entry);
            }
        }
        OctantIndicator(slots)
    }

    fn row_masks(&self, row: usize) -> Vec<u8> {
        (0..self.raster.cols()).map(|col| self.inflow_mask(row, col)).collect()
    }

    fn masks_serial(&self) -> Vec<Vec<u8>> {
        (0..self.raster.rows()).map(|row| self.row_masks(row)).collect()
    }

    fn masks_parallel(&self) -> Vec<Vec<u8>> {
        // Rows only read the shared raster, so no synchronisation is needed.
        (0..self.raster.rows())
            .into_par_iter()
            .map(|row| self.row_masks(row))
            .collect()
    }

    fn domain_flags(&self) -> Tilemap<bool> {
        match self.mask {
            Some(mask) => {
                let mut flags = Tilemap::new_with(self.raster.rows(), self.raster.cols(), false);
                for (row, col) in mask.cells() {
                    flags.set(row, col, true);
                }
                flags
            }
            None => Tilemap::new_with(self.raster.rows(), self.raster.cols(), true),
        }
    }

    fn build(&self, parallel: bool) -> InflowGraph {
        let rows = if parallel { self.masks_parallel() } else { self.masks_serial() };
        let masks = Tilemap::from_rows(self.raster.cols(), rows);
        InflowGraph::from_masks(masks, self.domain_flags())
    }
}

/// Per-cell list of the neighbors that discharge into it.
///
/// Built once per raster and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct InflowGraph {
    rows: usize,
    cols: usize,
    /// Sum of the inflow codes of each cell's contributing neighbors.
    masks: Tilemap<u8>,
    domain: Tilemap<bool>,
    cell_offsets: Vec<usize>,
    sources: Vec<Offset>,
}

impl InflowGraph {
    fn from_masks(masks: Tilemap<u8>, domain: Tilemap<bool>) -> Self {
        let edges: usize = masks.as_slice().iter().map(|m| m.count_ones() as usize).sum();
        let mut cell_offsets = Vec::with_capacity(masks.len() + 1);
        let mut sources = Vec::with_capacity(edges);

        for &mask in masks.as_slice() {
            cell_offsets.push(sources.len());
            sources.extend(decompose(mask));
        }
        cell_offsets.push(sources.len());

        Self {
            rows: masks.rows,
            cols: masks.cols,
            masks,
            domain,
            cell_offsets,
            sources,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of raster cells, including those outside the domain.
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Total number of inflow links.
    pub fn edge_count(&self) -> usize {
        self.sources.len()
    }

    /// Whether `(row, col)` is a node of the graph.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.domain.try_get(row, col).copied().unwrap_or(false)
    }

    /// Offsets of the neighbors draining into `(row, col)`, highest code
    /// first. `None` if the cell is off the raster or outside the domain.
    pub fn inflows(&self, row: usize, col: usize) -> Option<&[Offset]> {
        if !self.contains(row, col) {
            return None;
        }
        let idx = row * self.cols + col;
        let start = self.cell_offsets[idx];
        let end = self.cell_offsets[idx + 1];
        Some(&self.sources[start..end])
    }

    pub fn inflow_mask(&self, row: usize, col: usize) -> Option<u8> {
        if !self.contains(row, col) {
            return None;
        }
        Some(*self.masks.get(row, col))
    }

    pub fn inflow_count(&self, row: usize, col: usize) -> usize {
        self.inflows(row, col).map_or(0, |s| s.len())
    }

    /// Absolute coordinates of the cells draining into `(row, col)`.
    pub fn upstream_cells(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        self.inflows(row, col)
            .unwrap_or(&[])
            .iter()
            .filter_map(|&(drow, dcol)| self.masks.offset_coord(row, col, drow, dcol))
            .collect()
    }

    pub fn max_inflow_count(&self) -> usize {
        self.cell_offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }

    /// Inflow mask of every cell (0 outside the domain).
    pub fn mask_raster(&self) -> &Tilemap<u8> {
        &self.masks
    }

    /// Iterate over graph nodes in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[Offset])> + '_ {
        self.domain
            .iter()
            .filter(|(_, _, inside)| **inside)
            .map(move |(row, col, _)| {
                let idx = row * self.cols + col;
                let start = self.cell_offsets[idx];
                let end = self.cell_offsets[idx + 1];
                (row, col, &self.sources[start..end])
            })
    }

    pub fn summary(&self) -> InflowSummary {
        let mut summary = InflowSummary {
            cells: self.cell_count(),
            edges: self.edge_count(),
            max_inflow: self.max_inflow_count(),
            ..Default::default()
        };
        for (_, _, sources) in self.iter() {
            summary.domain_cells += 1;
            if sources.is_empty() {
                summary.without_inflow += 1;
            }
        }
        summary
    }
}

#[derive(Serialize)]
struct CellRecord<'a> {
    row: usize,
    col: usize,
    mask: u8,
    sources: &'a [Offset],
}

#[derive(Serialize)]
struct GraphRecord<'a> {
    rows: usize,
    cols: usize,
    edges: usize,
    cells: Vec<CellRecord<'a>>,
}

impl Serialize for InflowGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cells = self
            .iter()
            .filter(|(_, _, sources)| !sources.is_empty())
            .map(|(row, col, sources)| CellRecord {
                row,
                col,
                mask: *self.masks.get(row, col),
                sources,
            })
            .collect();

        GraphRecord {
            rows: self.rows,
            cols: self.cols,
            edges: self.edge_count(),
            cells,
        }
        .serialize(serializer)
    }
}

/// Counts describing a built graph
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InflowSummary {
    /// Raster cells
    pub cells: usize,
    /// Cells inside the computational domain
    pub domain_cells: usize,
    /// Inflow links
    pub edges: usize,
    /// Domain cells no neighbor drains into (ridges, divides, upper edges)
    pub without_inflow: usize,
    /// Largest in-degree
    pub max_inflow: usize,
}

impl std::fmt::Display for InflowSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cells ({} in domain), {} inflow links, {} without inflow, max in-degree {}",
            self.cells, self.domain_cells, self.edges, self.without_inflow, self.max_inflow
        )
    }
}

/// Which of the eight neighbors drain into one cell, in [`OCTANT_TABLE`]
/// slot order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OctantIndicator(pub [bool; 8]);

impl OctantIndicator {
    pub fn get(&self, slot: usize) -> bool {
        self.0.get(slot).copied().unwrap_or(false)
    }

    /// Whether the neighbor at `position` drains into the cell.
    pub fn at_position(&self, position: Octant) -> bool {
        OCTANT_TABLE
            .iter()
            .position(|e| e.position == position)
            .map_or(false, |slot| self.0[slot])
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&set| set).count()
    }

    /// Same value the full builder stores as the cell's inflow mask.
    pub fn to_mask(&self) -> u8 {
        OCTANT_TABLE
            .iter()
            .zip(self.0.iter())
            .filter(|(_, set)| **set)
            .map(|(e, _)| e.inflow_code)
            .sum()
    }

    /// `1.0` / `0.0` per slot, as consumed by the routing solver.
    pub fn as_f64(&self) -> [f64; 8] {
        self.0.map(|set| if set { 1.0 } else { 0.0 })
    }

    /// Offsets of the set slots, in slot order.
    pub fn offsets(&self) -> Vec<Offset> {
        OCTANT_TABLE
            .iter()
            .zip(self.0.iter())
            .filter(|(_, set)| **set)
            .map(|(e, _)| e.offset)
            .collect()
    }
}

/// Build the inflow graph of a whole raster (every cell in the domain).
pub fn build_inflow_graph(raster: &FlowDirectionRaster) -> InflowGraph {
    Domain { raster, mask: None }.build(false)
}

/// Build the inflow graph restricted to the cells of `mask`.
pub fn build_inflow_graph_masked(
    raster: &FlowDirectionRaster,
    mask: &DomainMask,
) -> FlowResult<InflowGraph> {
    mask.check_shape(raster)?;
    Ok(Domain { raster, mask: Some(mask) }.build(false))
}

/// Build with an explicit strategy.
pub fn build_inflow_graph_with(
    raster: &FlowDirectionRaster,
    mask: Option<&DomainMask>,
    params: &BuildParams,
) -> FlowResult<InflowGraph> {
    if let Some(mask) = mask {
        mask.check_shape(raster)?;
    }

    let parallel = params.resolve(raster.cell_count());
    debug!(
        "Building inflow graph for {}x{} raster (strategy: {}, parallel: {})",
        raster.rows(),
        raster.cols(),
        params.strategy,
        parallel
    );

    let graph = Domain { raster, mask }.build(parallel);
    info!("Inflow graph: {}", graph.summary());
    Ok(graph)
}

/// Indicator vector of one cell, without building the graph.
///
/// Targets off the raster yield an all-false vector.
pub fn octant_indicator(raster: &FlowDirectionRaster, row: usize, col: usize) -> OctantIndicator {
    Domain { raster, mask: None }.indicator(row, col)
}

pub fn octant_indicator_masked(
    raster: &FlowDirectionRaster,
    mask: &DomainMask,
    row: usize,
    col: usize,
) -> FlowResult<OctantIndicator> {
    mask.check_shape(raster)?;
    Ok(Domain { raster, mask: Some(mask) }.indicator(row, col))
}

/// Inflow mask of one cell, without building the graph.
pub fn inflow_mask_at(raster: &FlowDirectionRaster, row: usize, col: usize) -> u8 {
    Domain { raster, mask: None }.inflow_mask(row, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::direction::DECODE_PRIORITY;
    use crate::flow::raster::NO_DATA;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Every neighbor of the center drains into it; the center drains south.
    fn converging_3x3() -> FlowDirectionRaster {
        FlowDirectionRaster::from_codes(
            3,
            3,
            vec![
                2, 4, 8, //
                1, 4, 16, //
                128, 64, 32,
            ],
            NO_DATA,
        )
        .unwrap()
    }

    fn random_raster(rows: usize, cols: usize, seed: u64) -> FlowDirectionRaster {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let codes = (0..rows * cols)
            .map(|_| {
                if rng.gen_bool(0.1) {
                    NO_DATA
                } else {
                    DECODE_PRIORITY[rng.gen_range(0..8)] as i32
                }
            })
            .collect();
        FlowDirectionRaster::from_codes(rows, cols, codes, NO_DATA).unwrap()
    }

    #[test]
    fn test_single_cell_has_no_inflow() {
        for &code in DECODE_PRIORITY.iter() {
            let raster = FlowDirectionRaster::uniform(1, 1, code as i32).unwrap();
            assert_eq!(octant_indicator(&raster, 0, 0), OctantIndicator([false; 8]));
            let graph = build_inflow_graph(&raster);
            assert_eq!(graph.inflows(0, 0), Some(&[][..]));
        }
    }

    #[test]
    fn test_converging_neighbors_all_recorded() {
        let graph = build_inflow_graph(&converging_3x3());
        let center = graph.inflows(1, 1).unwrap();
        assert_eq!(center.len(), 8);
        assert_eq!(
            center,
            &[(1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1)]
        );
        assert_eq!(graph.inflow_mask(1, 1), Some(255));

        // The center itself drains into the cell below it.
        assert_eq!(graph.inflows(2, 1).unwrap(), &[(-1, 0)]);
        assert_eq!(graph.edge_count(), 9);
        for (_, _, sources) in graph.iter() {
            assert!(!sources.contains(&(0, 0)));
        }
    }

    #[test]
    fn test_south_flowing_column() {
        let raster = FlowDirectionRaster::uniform(10, 1, 4).unwrap();
        let graph = build_inflow_graph(&raster);
        assert_eq!(graph.inflows(0, 0).unwrap(), &[] as &[Offset]);
        for row in 1..10 {
            assert_eq!(graph.inflows(row, 0).unwrap(), &[(-1, 0)], "row {}", row);
            assert_eq!(graph.upstream_cells(row, 0), vec![(row - 1, 0)]);
        }
        assert_eq!(graph.edge_count(), 9);
    }

    #[test]
    fn test_isolated_sink_keeps_outflow() {
        // Every neighbor of the center drains away from it.
        let raster = FlowDirectionRaster::from_codes(
            3,
            3,
            vec![
                32, 64, 128, //
                16, 4, 1, //
                8, 4, 2,
            ],
            NO_DATA,
        )
        .unwrap();
        let graph = build_inflow_graph(&raster);
        assert_eq!(graph.inflow_count(1, 1), 0);
        assert_eq!(raster.outflow(1, 1), Some(Octant::S));
        assert_eq!(graph.inflows(2, 1).unwrap(), &[(-1, 0)]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let raster = random_raster(17, 23, 7);
        assert_eq!(build_inflow_graph(&raster), build_inflow_graph(&raster));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let raster = random_raster(64, 48, 42);
        let serial = build_inflow_graph_with(&raster, None, &BuildParams::serial()).unwrap();
        let parallel = build_inflow_graph_with(&raster, None, &BuildParams::parallel()).unwrap();
        assert_eq!(serial, parallel);
        assert_eq!(serial, build_inflow_graph(&raster));

        let mask = DomainMask::from_no_data(&raster);
        let serial = build_inflow_graph_with(&raster, Some(&mask), &BuildParams::serial()).unwrap();
        let parallel = build_inflow_graph_with(&raster, Some(&mask), &BuildParams::parallel()).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_every_outflow_recorded_once() {
        let raster = random_raster(30, 30, 3);
        let graph = build_inflow_graph(&raster);

        let mut expected = 0;
        for row in 0..raster.rows() {
            for col in 0..raster.cols() {
                if let Some((dr, dc)) = raster.downstream(row, col) {
                    expected += 1;
                    assert!(
                        graph.upstream_cells(dr, dc).contains(&(row, col)),
                        "({}, {}) drains into ({}, {}) but is not recorded",
                        row, col, dr, dc
                    );
                }
            }
        }
        assert_eq!(graph.edge_count(), expected);
    }

    #[test]
    fn test_indicator_agrees_with_graph() {
        let raster = random_raster(12, 9, 11);
        let graph = build_inflow_graph(&raster);
        for row in 0..12 {
            for col in 0..9 {
                let indicator = octant_indicator(&raster, row, col);
                assert_eq!(Some(indicator.to_mask()), graph.inflow_mask(row, col));
                assert_eq!(inflow_mask_at(&raster, row, col), indicator.to_mask());
                assert_eq!(indicator.count(), graph.inflow_count(row, col));
            }
        }
    }

    #[test]
    fn test_indicator_slots_and_float_view() {
        let raster = converging_3x3();
        let indicator = octant_indicator(&raster, 2, 1);
        // Only the neighbor above (slot 1, N) drains into the bottom middle cell.
        assert_eq!(indicator.0, [false, true, false, false, false, false, false, false]);
        assert!(indicator.at_position(Octant::N));
        assert_eq!(indicator.as_f64(), [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(indicator.offsets(), vec![(-1, 0)]);
    }

    #[test]
    fn test_indicator_off_raster_is_empty() {
        let raster = converging_3x3();
        assert_eq!(octant_indicator(&raster, 3, 1).count(), 0);
        assert_eq!(octant_indicator(&raster, 0, 99).count(), 0);
        assert_eq!(inflow_mask_at(&raster, 3, 1), 0);
    }

    #[test]
    fn test_offsets_partition_sources() {
        let raster = random_raster(25, 19, 5);
        let graph = build_inflow_graph(&raster);
        assert_eq!(graph.cell_offsets.len(), raster.cell_count() + 1);
        assert_eq!(graph.cell_offsets.first(), Some(&0));
        assert_eq!(graph.cell_offsets.last(), Some(&graph.edge_count()));
        assert!(graph.cell_offsets.windows(2).all(|w| w[0] <= w[1]));

        let degrees: usize = graph.iter().map(|(_, _, sources)| sources.len()).sum();
        assert_eq!(degrees, graph.edge_count());
        let widest = graph.iter().map(|(_, _, s)| s.len()).max().unwrap_or(0);
        assert_eq!(graph.max_inflow_count(), widest);
    }

    #[test]
    fn test_masked_neighbor_never_contributes() {
        let raster = converging_3x3();
        let mut mask = DomainMask::full(3, 3);
        mask.exclude(0, 0);
        mask.exclude(2, 1);

        let graph = build_inflow_graph_masked(&raster, &mask).unwrap();
        let center = graph.inflows(1, 1).unwrap();
        // (0,0) was the NW source and (2,1) the S source.
        assert_eq!(center.len(), 6);
        assert!(!center.contains(&(-1, -1)));
        assert!(!center.contains(&(1, 0)));
        assert_eq!(graph.inflow_mask(1, 1), Some(255 - 64 - 2));
        assert_eq!(graph.inflows(2, 1), None);
        assert_eq!(graph.inflows(0, 0), None);
        assert_eq!(graph.inflow_mask(2, 1), None);
        assert_eq!(graph.edge_count(), 6);

        let indicator = octant_indicator_masked(&raster, &mask, 1, 1).unwrap();
        assert_eq!(Some(indicator.to_mask()), graph.inflow_mask(1, 1));
        assert_eq!(octant_indicator_masked(&raster, &mask, 2, 1).unwrap().count(), 0);
    }

    #[test]
    fn test_no_data_neighbor_reads_as_no_inflow() {
        let raster = FlowDirectionRaster::from_codes(3, 1, vec![4, NO_DATA, 4], NO_DATA).unwrap();
        let graph = build_inflow_graph(&raster);
        assert_eq!(graph.inflow_count(1, 0), 1);
        assert_eq!(graph.inflow_count(2, 0), 0);
    }

    #[test]
    fn test_mask_shape_checked() {
        let raster = converging_3x3();
        let mask = DomainMask::full(2, 2);
        assert!(build_inflow_graph_masked(&raster, &mask).is_err());
        assert!(build_inflow_graph_with(&raster, Some(&mask), &BuildParams::default()).is_err());
        assert!(octant_indicator_masked(&raster, &mask, 0, 0).is_err());
    }

    #[test]
    fn test_empty_raster() {
        let raster = FlowDirectionRaster::from_codes(0, 5, vec![], NO_DATA).unwrap();
        let graph = build_inflow_graph(&raster);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.max_inflow_count(), 0);
        assert_eq!(graph.inflows(0, 0), None);
    }

    #[test]
    fn test_summary_counts() {
        let graph = build_inflow_graph(&converging_3x3());
        let summary = graph.summary();
        assert_eq!(summary.cells, 9);
        assert_eq!(summary.domain_cells, 9);
        assert_eq!(summary.edges, 9);
        assert_eq!(summary.max_inflow, 8);
        // Only the center and the cell below it receive flow.
        assert_eq!(summary.without_inflow, 7);
    }

    #[test]
    fn test_serialized_form_lists_receiving_cells() {
        let raster = FlowDirectionRaster::uniform(3, 1, 4).unwrap();
        let json = serde_json::to_value(build_inflow_graph(&raster)).unwrap();
        assert_eq!(json["rows"], 3);
        assert_eq!(json["edges"], 2);
        let cells = json["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0]["row"], 1);
        assert_eq!(cells[0]["mask"], 4);
        assert_eq!(cells[0]["sources"], serde_json::json!([[-1, 0]]));
    }
}

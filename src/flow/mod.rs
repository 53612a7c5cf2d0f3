//! Flow-direction inflow graph engine
//!
//! Turns a single-flow-direction (D8) raster into, for every cell, the
//! list of neighbors that discharge into it:
//! - **Direction codec**: D8 code ↔ neighbor offset table and mask decoding
//! - **Raster & domain**: validated flow codes and the computational mask
//! - **Inflow builder**: full-raster graph pass and single-cell indicator query

pub mod direction;
pub mod inflow;
pub mod mask;
pub mod params;
pub mod raster;

pub use direction::{decompose, offset_for_code, Octant, OctantEntry, Offset, DECODE_PRIORITY, OCTANT_TABLE};
pub use inflow::{
    build_inflow_graph, build_inflow_graph_masked, build_inflow_graph_with, inflow_mask_at,
    octant_indicator, octant_indicator_masked, InflowGraph, InflowSummary, OctantIndicator,
};
pub use mask::DomainMask;
pub use params::{BuildParams, BuildStrategy};
pub use raster::{FlowDirectionRaster, NO_DATA};

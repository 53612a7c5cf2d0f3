//! Surface runoff inflow graph library
//!
//! Re-exports modules for use by binaries and tools.

pub mod error;
pub mod flow;
pub mod logging;
pub mod raster_io;
pub mod tilemap;

pub use error::{FlowError, FlowResult};

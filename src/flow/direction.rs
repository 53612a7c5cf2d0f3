//! D8 direction codec.
//!
//! Each cell of a flow-direction raster names the neighbor it drains into
//! with one power-of-two code:
//!
//! ```text
//!  32  64 128
//!  16   X   1
//!   8   4   2
//! ```
//!
//! Because every code is a distinct bit, a set of inflowing neighbors can
//! be summed into a single byte and decoded back without ambiguity.

use crate::error::{FlowError, FlowResult};

/// Relative `(Δrow, Δcol)` offset between two cells. Rows grow southwards.
pub type Offset = (i32, i32);

/// Compass octant a D8 code can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Octant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Octant {
    pub const ALL: [Octant; 8] = [
        Octant::N,
        Octant::NE,
        Octant::E,
        Octant::SE,
        Octant::S,
        Octant::SW,
        Octant::W,
        Octant::NW,
    ];

    /// D8 code of a cell draining towards this octant.
    pub const fn code(self) -> u8 {
        match self {
            Octant::E => 1,
            Octant::SE => 2,
            Octant::S => 4,
            Octant::SW => 8,
            Octant::W => 16,
            Octant::NW => 32,
            Octant::N => 64,
            Octant::NE => 128,
        }
    }

    /// Offset from a cell to its neighbor in this octant.
    pub const fn delta(self) -> Offset {
        match self {
            Octant::N => (-1, 0),
            Octant::NE => (-1, 1),
            Octant::E => (0, 1),
            Octant::SE => (1, 1),
            Octant::S => (1, 0),
            Octant::SW => (1, -1),
            Octant::W => (0, -1),
            Octant::NW => (-1, -1),
        }
    }

    pub const fn opposite(self) -> Octant {
        match self {
            Octant::N => Octant::S,
            Octant::NE => Octant::SW,
            Octant::E => Octant::W,
            Octant::SE => Octant::NW,
            Octant::S => Octant::N,
            Octant::SW => Octant::NE,
            Octant::W => Octant::E,
            Octant::NW => Octant::SE,
        }
    }

    pub fn from_code(code: i32) -> FlowResult<Octant> {
        match code {
            1 => Ok(Octant::E),
            2 => Ok(Octant::SE),
            4 => Ok(Octant::S),
            8 => Ok(Octant::SW),
            16 => Ok(Octant::W),
            32 => Ok(Octant::NW),
            64 => Ok(Octant::N),
            128 => Ok(Octant::NE),
            _ => Err(FlowError::InvalidCode { code: code as i64 }),
        }
    }

    pub fn is_valid_code(code: i32) -> bool {
        Self::from_code(code).is_ok()
    }
}

impl std::fmt::Display for Octant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Octant::N => "N",
            Octant::NE => "NE",
            Octant::E => "E",
            Octant::SE => "SE",
            Octant::S => "S",
            Octant::SW => "SW",
            Octant::W => "W",
            Octant::NW => "NW",
        };
        f.write_str(name)
    }
}

/// One neighbor position around a receiving cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctantEntry {
    /// Where the neighbor sits relative to the receiving cell.
    pub position: Octant,
    /// Offset from the receiving cell to the neighbor.
    pub offset: Offset,
    /// Code the neighbor must carry to drain into the receiving cell.
    pub inflow_code: u8,
}

const fn entry(position: Octant) -> OctantEntry {
    OctantEntry {
        position,
        offset: position.delta(),
        inflow_code: position.opposite().code(),
    }
}

/// Neighbor probe table in canonical slot order.
///
/// ```text
///   2   1   0
///   3   X   7
///   4   5   6
/// ```
pub const OCTANT_TABLE: [OctantEntry; 8] = [
    entry(Octant::NE),
    entry(Octant::N),
    entry(Octant::NW),
    entry(Octant::W),
    entry(Octant::SW),
    entry(Octant::S),
    entry(Octant::SE),
    entry(Octant::E),
];

/// Codes in the order an inflow mask is decoded. Strictly descending.
pub const DECODE_PRIORITY: [u8; 8] = [128, 64, 32, 16, 8, 4, 2, 1];

/// Table entry whose neighbor drains into the receiving cell with `code`.
pub fn entry_for_code(code: i32) -> Option<&'static OctantEntry> {
    OCTANT_TABLE.iter().find(|e| e.inflow_code as i32 == code)
}

/// Offset from a receiving cell to the neighbor that drains into it
/// with `code`. Code 4 (draining south) is the neighbor above, `(-1, 0)`.
pub fn offset_for_code(code: i32) -> FlowResult<Offset> {
    entry_for_code(code)
        .map(|e| e.offset)
        .ok_or(FlowError::InvalidCode { code: code as i64 })
}

/// Decode an inflow mask into the offsets of the neighbors it contains,
/// highest code first.
///
/// The greedy subtraction is exact only because every candidate is a
/// distinct power of two.
pub fn decompose(mask: u8) -> Vec<Offset> {
    let mut remaining = mask;
    let mut offsets = Vec::with_capacity(remaining.count_ones() as usize);

    for &code in DECODE_PRIORITY.iter() {
        if remaining >= code {
            if let Some(e) = entry_for_code(code as i32) {
                offsets.push(e.offset);
            }
            remaining -= code;
        }
    }

    offsets
}

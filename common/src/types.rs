//! Common Types for the LTE Downlink Receiver
//!
//! Defines the fundamental identity types used throughout the receiver chain

use serde::{Deserialize, Serialize};

/// Physical-layer cell identity (0-503)
///
/// Composed as `3 * group + sector` from the cell-identity group N_id_1
/// (0-167, recovered from secondary synchronization) and the sector id
/// N_id_2 (0-2, recovered from primary synchronization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(pub u16);

impl CellId {
    /// Maximum valid cell identity value
    pub const MAX: u16 = 503;

    /// Create a new cell identity with validation
    pub fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Compose a cell identity from its group and sector parts
    pub fn from_parts(group: u16, sector: u8) -> Option<Self> {
        if group <= 167 && sector <= 2 {
            Some(Self(3 * group + sector as u16))
        } else {
            None
        }
    }

    /// Cell-identity group N_id_1 (0-167)
    pub fn group(&self) -> u16 {
        self.0 / 3
    }

    /// Sector id N_id_2 (0-2)
    pub fn sector(&self) -> u8 {
        (self.0 % 3) as u8
    }
}

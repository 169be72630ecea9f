//! Streaming-Graph Contracts
//!
//! Control messages, block annotations and the data-block carriers exchanged
//! between receiver stages. Stages never share mutable state; everything
//! defined here is copied by value across stage boundaries. Control messages
//! are delivered through each stage's inbound queue and drained at the start
//! of the next processing call, so a late message applies to future calls
//! only.

use crate::types::CellId;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Typed control messages exchanged between stages and the surrounding
/// system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlMessage {
    /// Sector id N_id_2 recovered from primary synchronization (0-2)
    CellSubId(u8),
    /// Full physical cell identity, published once the resolver locks
    CellId(CellId),
    /// Absolute sample position of the radio frame start
    FrameStart(u64),
    /// Freeze position and identity tracking
    Lock,
    /// Resume tracking and re-acquire
    Unlock,
    /// Corrected half-frame start position
    HalfFrameStart(u64),
    /// Subframe index (0-9) for control-format association
    SubframeIndex(u8),
    /// Control-format indicator recovered for a subframe
    Cfi { subframe: u8, cfi: u8 },
}

/// Annotation key attached to positions within an emitted data block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKey {
    /// Broadcast-channel quarter index (0-3) for downstream reassembly
    PbchQuarter,
}

/// A (position, key, value) marker on an emitted data block
///
/// Downstream consumers rely on these to reassemble logical units that the
/// scheduler split across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Position relative to the start of the carrying block
    pub position: usize,
    pub key: TagKey,
    pub value: i64,
}

/// One extracted OFDM symbol annotated with its absolute source position
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolBlock {
    pub samples: Vec<Complex32>,
    /// Absolute offset of the first sample in the source stream
    pub source_offset: u64,
}

/// A block of real soft values with block annotations
#[derive(Debug, Clone, PartialEq)]
pub struct SoftBlock {
    pub values: Vec<f32>,
    /// Absolute offset of the first value in the source stream
    pub source_offset: u64,
    pub tags: Vec<Tag>,
}

impl SoftBlock {
    /// Create an unannotated block
    pub fn new(values: Vec<f32>, source_offset: u64) -> Self {
        Self {
            values,
            source_offset,
            tags: Vec::new(),
        }
    }
}

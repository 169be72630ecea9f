//! Physical Layer (PHY) Receiver Stages
//!
//! This module contains the LTE downlink cell-search and broadcast-channel
//! acquisition chain according to 3GPP TS 36.211/36.212:
//! synchronization-sequence generation, OFDM symbol selection,
//! cell-identity resolution, broadcast descrambling, control-format
//! detection and CRC verification.
//!
//! Every stage is a plain synchronous struct driven by an external
//! streaming scheduler: one fixed-size block in, at most one block or a set
//! of control messages out. Inbound control messages are queued with
//! `push_message` and take effect at the start of the next processing call.

pub mod crc;
pub mod frame;
pub mod pbch;
pub mod pcfich;
pub mod pss;
pub mod sss;
pub mod symbol_selector;

// Re-export commonly used types
pub use crc::CrcCheck;
pub use frame::Numerology;
pub use pbch::PbchDescrambler;
pub use pcfich::{CfiDetector, CfiResult};
pub use pss::PssGenerator;
pub use sss::{SssGenerator, SssResolver};
pub use symbol_selector::SymbolSelector;

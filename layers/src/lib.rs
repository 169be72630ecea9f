//! LTE Downlink Receiver Layers
//!
//! This crate implements the cell-search and broadcast-channel acquisition
//! core of an LTE downlink receiver according to 3GPP TS 36.211/36.212.

pub mod phy;

use thiserror::Error;

/// Common errors for receiver stages
#[derive(Error, Debug)]
pub enum LayerError {
    #[error("Invalid block size: expected {expected}, got {got}")]
    InvalidBlockSize { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

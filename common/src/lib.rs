//! Common Utilities and Types Library
//!
//! This crate provides the types and utilities shared across the LTE
//! downlink receiver stages.

pub mod stream;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use stream::*;
pub use types::*;

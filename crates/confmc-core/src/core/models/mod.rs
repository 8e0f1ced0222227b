//! # Core Models Module
//!
//! Data structures for the molecules refined by the Monte Carlo loop.
//!
//! - [`molecule`] - A dataset molecule: fixed atom identity plus its geometry.
//! - [`topology`] - Bond orders and bonds inferred from geometry.

pub mod molecule;
pub mod topology;

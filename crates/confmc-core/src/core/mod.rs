//! # Core Module
//!
//! Stateless building blocks of the Monte Carlo refinement pipeline: molecule
//! models, dataset tables and sources, checkpoint metadata, structural line
//! notation and coordinate-file I/O.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Molecules with fixed atom identity, bonds
//! - **Element Data** ([`elements`]) - Symbol, atomic number and valence tables
//! - **Datasets** ([`dataset`]) - Type decoders, padded capacity and validation splits
//! - **Checkpoints** ([`checkpoint`]) - Training-argument schema and weight selection
//! - **Structure Notation** ([`notation`]) - Bond perception and line notation from geometry
//! - **File I/O** ([`io`]) - Extended XYZ frames
//!
//! Nothing in this module holds run state; the [`crate::engine`] layer owns the
//! evolving geometry of a trajectory.

pub mod checkpoint;
pub mod dataset;
pub mod elements;
pub mod io;
pub mod models;
pub mod notation;

//! # Workflows Module
//!
//! Top-level entry points of the library. A workflow takes a dataset, a
//! [`crate::engine::config::RefineConfig`] and its external collaborators, and
//! drives the engine from the first sample to the run summary.
//!
//! - **Refinement Workflow** ([`refine`]) - Filter candidates from a validation
//!   split and run one Monte Carlo trajectory per accepted molecule.

pub mod refine;

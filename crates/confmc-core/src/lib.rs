//! # confmc Core Library
//!
//! Monte Carlo refinement of molecular conformers driven by a pretrained
//! diffusion model. Starting from real molecules of a validation split, each
//! Monte Carlo step asks the model to partially re-noise and re-denoise the
//! current structure, and every resulting conformation is written to disk for
//! later energy analysis.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`), dataset
//!   tables, checkpoint metadata, structural notation and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The candidate filter, the padded tensor
//!   encoder, the diffusion-oracle contract, atom-identity validation and the
//!   per-molecule trajectory runner with its writer.
//!
//! - **[`workflows`]: The Public API.** The batch procedure that walks a dataset,
//!   filters candidates and runs one trajectory per accepted molecule.
//!
//! The diffusion model itself is never implemented here. It is consumed through
//! the [`engine::oracle::DiffusionOracle`] trait so that any sampler backend, or
//! a deterministic test double, can be plugged in.

pub mod core;
pub mod engine;
pub mod workflows;

//! # Engine Module
//!
//! The stateful machinery of Monte Carlo conformer refinement. Everything that
//! touches an evolving trajectory lives here; the [`crate::core`] layer only
//! supplies immutable molecules and file formats.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Step window, MC length, sample cap, seeds and flags
//! - **Candidate Filter** ([`filter`]) - Structural-simplicity and charge checks
//! - **Encoding** ([`encoder`]) - Fixed-capacity padded tensors from a molecule and geometry
//! - **Oracle Contract** ([`oracle`]) - The diffusion-model interface and its chains
//! - **Validation** ([`validation`]) - Atom-identity and charge-drift checks, log-and-continue
//! - **Runner** ([`runner`]) - The per-molecule `Init -> Stepping -> Done` loop
//! - **Persistence** ([`trajectory`]) - One directory of XYZ frames per trajectory
//! - **Energy Hook** ([`energy`]) - Optional energy deltas against the ground state
//! - **State** ([`state`]), **Progress** ([`progress`]), **Errors** ([`error`])
//!
//! All of it is single-threaded. The oracle call blocks, and a run is resumed
//! only by re-running it; existing trajectory directories are reused.

pub mod config;
pub mod encoder;
pub mod energy;
pub mod error;
pub mod filter;
pub mod oracle;
pub mod progress;
pub mod runner;
pub mod state;
pub mod trajectory;
pub mod validation;

//! Provides input/output functionality for coordinate files.
//!
//! Trajectory frames are persisted as extended XYZ through the [`traits::FrameFile`]
//! interface, so that analysis tools reading one frame per file can consume
//! the ground state and every Monte Carlo step directly.

pub mod frame;
pub mod traits;
pub mod xyz;

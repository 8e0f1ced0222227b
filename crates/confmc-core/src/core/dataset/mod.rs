//! Dataset-side collaborators: the per-dataset type tables the diffusion model
//! was trained with, and an iterable validation split.

pub mod error;
pub mod info;
pub mod source;

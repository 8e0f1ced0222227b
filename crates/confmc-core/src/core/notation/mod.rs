//! Structural line notation derived from 3D geometry.
//!
//! The candidate filter only inspects a notation string, so the parser that
//! produces it sits behind [`StructureNotation`]. [`writer::LineNotation`] is the
//! built-in distance-based implementation.

pub mod bonds;
pub mod writer;

use crate::core::models::molecule::Molecule;

pub trait StructureNotation {
    /// Returns the notation for the molecule's current geometry, or `None` if
    /// no chemically valid structure can be derived from it.
    fn notation(&self, molecule: &Molecule) -> Option<String>;
}

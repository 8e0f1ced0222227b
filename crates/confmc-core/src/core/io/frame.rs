use nalgebra::Point3;

/// A single set of atomic coordinates with a per-atom scalar charge attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub atomic_numbers: Vec<u8>,
    pub positions: Vec<Point3<f64>>,
    pub charges: Vec<f64>,
}

impl Frame {
    pub fn new(atomic_numbers: Vec<u8>, positions: Vec<Point3<f64>>, charges: Vec<f64>) -> Self {
        Self {
            atomic_numbers,
            positions,
            charges,
        }
    }

    pub fn len(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atomic_numbers.is_empty()
    }
}

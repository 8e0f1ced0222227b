#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BondOrder {
    Single = 1,
    Double = 2,
    Triple = 3,
}

impl BondOrder {
    /// Valence the bond consumes on each of its atoms.
    pub fn valence(self) -> u8 {
        self as u8
    }

    /// Line-notation symbol; single bonds are implicit.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Single => "",
            Self::Double => "=",
            Self::Triple => "#",
        }
    }
}

/// A bond between two atoms, addressed by their index in the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atom1,
            atom2,
            order,
        }
    }
}

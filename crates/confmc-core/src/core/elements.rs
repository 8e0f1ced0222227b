use phf::{Map, phf_map};

#[rustfmt::skip]
static ATOMIC_NUMBERS: Map<&'static str, u8> = phf_map! {
    "H" => 1,
    "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9,
    "Al" => 13, "Si" => 14, "P" => 15, "S" => 16, "Cl" => 17,
    "As" => 33, "Br" => 35,
    "I" => 53,
    "Hg" => 80, "Bi" => 83,
};

#[rustfmt::skip]
static SYMBOLS: Map<u8, &'static str> = phf_map! {
    1u8 => "H",
    5u8 => "B", 6u8 => "C", 7u8 => "N", 8u8 => "O", 9u8 => "F",
    13u8 => "Al", 14u8 => "Si", 15u8 => "P", 16u8 => "S", 17u8 => "Cl",
    33u8 => "As", 35u8 => "Br",
    53u8 => "I",
    80u8 => "Hg", 83u8 => "Bi",
};

/// Maximum number of bonds (counted by order) an element may carry in a
/// neutral closed-shell molecule.
#[rustfmt::skip]
static MAX_VALENCE: Map<u8, u8> = phf_map! {
    1u8 => 1,
    5u8 => 3, 6u8 => 4, 7u8 => 3, 8u8 => 2, 9u8 => 1,
    13u8 => 3, 14u8 => 4, 15u8 => 5, 16u8 => 6, 17u8 => 1,
    33u8 => 3, 35u8 => 1,
    53u8 => 1,
    80u8 => 2, 83u8 => 5,
};

pub fn atomic_number(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol.trim()).copied()
}

pub fn symbol(atomic_number: u8) -> Option<&'static str> {
    SYMBOLS.get(&atomic_number).copied()
}

pub fn max_valence(atomic_number: u8) -> Option<u8> {
    MAX_VALENCE.get(&atomic_number).copied()
}

pub fn is_hydrogen(atomic_number: u8) -> bool {
    atomic_number == 1
}

//! Access bits codec
//!
//! Bytes 6..=8 of a sector trailer store four access condition triples,
//! each bit once plain and once inverted (`Cxy` is bit `x` of slot `y`):
//!
//! ```text
//! +-----+------+------+------+------+------+------+------+------+
//! |     |   7  |   6  |   5  |   4  |   3  |   2  |   1  |   0  |
//! +-----+------+------+------+------+------+------+------+------+
//! | [6] | ~C23 | ~C22 | ~C21 | ~C20 | ~C13 | ~C12 | ~C11 | ~C10 |
//! | [7] |  C13 |  C12 |  C11 |  C10 | ~C33 | ~C32 | ~C31 | ~C30 |
//! | [8] |  C33 |  C32 |  C31 |  C30 |  C23 |  C22 |  C21 |  C20 |
//! +-----+------+------+------+------+------+------+------+------+
//! ```

use std::ops::Index;

use serde::Serialize;
use thiserror::Error;

use crate::hex::hexify;

/// Number of slots in an access pool
pub const POOL_SLOTS: usize = 4;

/// Access bits of a factory-fresh card (`FF 07 80`)
///
/// Data blocks use combo `000`, the trailer combo `001`.
pub const TRANSPORT_ACCESS_BITS: [u8; 3] = [0xFF, 0x07, 0x80];

/// The stored complements disagree with the plain bits
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Access bits integrity violated: {}", hexify(.bytes))]
pub struct AccessBitsIntegrityViolation {
    pub bytes: [u8; 3],
}

/// Access condition bits of one pool slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AccessTriple {
    pub c1: bool,
    pub c2: bool,
    pub c3: bool,
}

impl AccessTriple {
    pub const fn new(c1: bool, c2: bool, c3: bool) -> Self {
        Self { c1, c2, c3 }
    }
}

/// Packed `c1 c2 c3` view of an [`AccessTriple`], used to index permission tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AccessCombo(u8);

impl AccessCombo {
    /// All eight combos in ascending order
    pub const ALL: [AccessCombo; 8] = [
        Self(0b000),
        Self(0b001),
        Self(0b010),
        Self(0b011),
        Self(0b100),
        Self(0b101),
        Self(0b110),
        Self(0b111),
    ];

    /// Build a combo from its 3-bit value (higher bits are dropped)
    pub const fn new(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl From<AccessTriple> for AccessCombo {
    fn from(triple: AccessTriple) -> Self {
        combo_of(triple)
    }
}

impl From<AccessCombo> for AccessTriple {
    fn from(combo: AccessCombo) -> Self {
        triple_of(combo)
    }
}

/// Pack a triple into its combo
pub const fn combo_of(triple: AccessTriple) -> AccessCombo {
    AccessCombo(((triple.c1 as u8) << 2) | ((triple.c2 as u8) << 1) | (triple.c3 as u8))
}

/// Unpack a combo into its triple
pub const fn triple_of(combo: AccessCombo) -> AccessTriple {
    AccessTriple {
        c1: combo.0 & 0b100 != 0,
        c2: combo.0 & 0b010 != 0,
        c3: combo.0 & 0b001 != 0,
    }
}

/// The four access condition triples of a sector trailer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AccessPool([AccessTriple; POOL_SLOTS]);

impl AccessPool {
    /// Pool of a factory-fresh card, decoded from [`TRANSPORT_ACCESS_BITS`]
    pub const TRANSPORT: AccessPool = AccessPool([
        AccessTriple::new(false, false, false),
        AccessTriple::new(false, false, false),
        AccessTriple::new(false, false, false),
        AccessTriple::new(false, false, true),
    ]);

    /// Build a pool from explicit triples
    ///
    /// Only [`decode`] produces pools from card data; this is for
    /// preparing new access bits to write.
    pub const fn new(slots: [AccessTriple; POOL_SLOTS]) -> Self {
        Self(slots)
    }

    pub fn from_combos(combos: [AccessCombo; POOL_SLOTS]) -> Self {
        Self(combos.map(triple_of))
    }

    pub fn combos(&self) -> [AccessCombo; POOL_SLOTS] {
        self.0.map(combo_of)
    }

    pub fn slot(&self, slot: usize) -> Option<&AccessTriple> {
        self.0.get(slot)
    }

    /// Access bits of the trailer itself (slot 3)
    pub fn trailer(&self) -> AccessTriple {
        self.0[POOL_SLOTS - 1]
    }
}

impl Index<usize> for AccessPool {
    type Output = AccessTriple;

    fn index(&self, slot: usize) -> &AccessTriple {
        &self.0[slot]
    }
}

/// Collect bit `select` of every slot into a nibble (slot `i` -> bit `i`)
fn nibble(pool: &AccessPool, select: fn(&AccessTriple) -> bool) -> u8 {
    pool.0
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, triple)| acc | ((select(triple) as u8) << i))
}

fn inverted(nibble: u8) -> u8 {
    !nibble & 0x0F
}

fn check_integrity(byte6: u8, byte7: u8, byte8: u8) -> Result<(), AccessBitsIntegrityViolation> {
    let (c2_inv, c1_inv) = (byte6 >> 4, byte6 & 0x0F);
    let (c1, c3_inv) = (byte7 >> 4, byte7 & 0x0F);
    let (c3, c2) = (byte8 >> 4, byte8 & 0x0F);

    if c1_inv != inverted(c1) || c2_inv != inverted(c2) || c3_inv != inverted(c3) {
        return Err(AccessBitsIntegrityViolation {
            bytes: [byte6, byte7, byte8],
        });
    }
    Ok(())
}

/// Decode trailer bytes 6, 7 and 8 into an access pool
///
/// The redundancy check runs before any bit is extracted.
pub fn decode(byte6: u8, byte7: u8, byte8: u8) -> Result<AccessPool, AccessBitsIntegrityViolation> {
    check_integrity(byte6, byte7, byte8)?;

    let c1 = byte7 >> 4;
    let c2 = byte8 & 0x0F;
    let c3 = byte8 >> 4;

    let mut slots = [AccessTriple::default(); POOL_SLOTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        *slot = AccessTriple {
            c1: (c1 >> i) & 1 == 1,
            c2: (c2 >> i) & 1 == 1,
            c3: (c3 >> i) & 1 == 1,
        };
    }
    Ok(AccessPool(slots))
}

/// Encode an access pool into trailer bytes 6, 7 and 8
pub fn encode(pool: &AccessPool) -> Result<[u8; 3], AccessBitsIntegrityViolation> {
    let c1 = nibble(pool, |t| t.c1);
    let c2 = nibble(pool, |t| t.c2);
    let c3 = nibble(pool, |t| t.c3);

    let byte6 = (inverted(c2) << 4) | inverted(c1);
    let byte7 = (c1 << 4) | inverted(c3);
    let byte8 = (c3 << 4) | c2;

    check_integrity(byte6, byte7, byte8)?;
    Ok([byte6, byte7, byte8])
}

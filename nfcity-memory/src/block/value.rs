//! Value block format
//!
//! A value block stores a signed 32-bit little-endian value three times
//! (plain, inverted, plain) followed by a one-byte address stored as
//! `addr ~addr addr ~addr`.

use serde::Serialize;

use crate::geometry::BLOCK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValueBlock {
    pub value: i32,
    pub address: u8,
}

impl ValueBlock {
    pub fn new(value: i32, address: u8) -> Self {
        Self { value, address }
    }

    /// Parse a value block payload
    ///
    /// Returns `None` if the redundant copies disagree.
    pub fn from_bytes(data: &[u8; BLOCK_SIZE]) -> Option<Self> {
        let word = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

        let (value, inverted, copy) = (word(0), word(4), word(8));
        if value != copy || inverted != !value {
            return None;
        }

        let address = data[12];
        if data[13] != !address || data[14] != address || data[15] != !address {
            return None;
        }

        Some(Self {
            value: value as i32,
            address,
        })
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let value = self.value.to_le_bytes();
        let inverted = (!self.value).to_le_bytes();

        let mut data = [0u8; BLOCK_SIZE];
        data[0..4].copy_from_slice(&value);
        data[4..8].copy_from_slice(&inverted);
        data[8..12].copy_from_slice(&value);
        data[12] = self.address;
        data[13] = !self.address;
        data[14] = self.address;
        data[15] = !self.address;
        data
    }
}

//! Sector read events
//!
//! Shapes of the data delivered by the reader transport: one
//! [`SectorRead`] per authenticated sector, carrying a [`RawBlock`] for
//! every block including the trailer.

use serde::{Deserialize, Serialize};

use super::MemoryError;
use crate::geometry::{BlockAddress, BLOCK_SIZE};
use crate::hex::hexify;
use crate::picc::Key;

/// Block bytes as received from the reader
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlockDto", into = "RawBlockDto")]
pub struct RawBlock {
    pub address: BlockAddress,
    pub payload: [u8; BLOCK_SIZE],
}

impl RawBlock {
    pub fn new(address: BlockAddress, payload: [u8; BLOCK_SIZE]) -> Self {
        Self { address, payload }
    }

    /// Build from a variable-length payload, which must be exactly 16 bytes
    pub fn from_slice(address: BlockAddress, data: &[u8]) -> Result<Self, MemoryError> {
        let payload = data.try_into().map_err(|_| MemoryError::InvalidPayloadLength {
            address,
            length: data.len(),
        })?;
        Ok(Self { address, payload })
    }
}

impl std::fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawBlock({}: {})", self.address, hexify(&self.payload))
    }
}

/// Wire form of a block: `{"address": 4, "data": [..16 bytes..]}`
#[derive(Serialize, Deserialize)]
struct RawBlockDto {
    address: BlockAddress,
    data: Vec<u8>,
}

impl TryFrom<RawBlockDto> for RawBlock {
    type Error = MemoryError;

    fn try_from(dto: RawBlockDto) -> Result<Self, Self::Error> {
        RawBlock::from_slice(dto.address, &dto.data)
    }
}

impl From<RawBlock> for RawBlockDto {
    fn from(block: RawBlock) -> Self {
        Self {
            address: block.address,
            data: block.payload.to_vec(),
        }
    }
}

/// One sector read: the payloads of every block and the key used to get them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorRead {
    /// Sector index
    pub offset: usize,
    pub key: Key,
    pub blocks: Vec<RawBlock>,
}

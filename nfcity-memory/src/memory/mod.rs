//! Card memory image
//!
//! [`Memory`] is created once per card session from the card subtype and
//! holds one [`Sector`] per sector of the card, all blocks undefined
//! until their sector is read.

mod read;
mod sector;

pub use read::{RawBlock, SectorRead};
pub use sector::Sector;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::access::AccessBitsIntegrityViolation;
use crate::block::Block;
use crate::geometry::{self, BlockAddress, BLOCK_SIZE};
use crate::picc::{Picc, PiccType};

/// UID length assumed when the card's UID is not known
pub const DEFAULT_UID_LENGTH: usize = 4;

/// Longest UID that still leaves room for BCC, SAK and ATQA in block 0
pub const MAX_UID_LENGTH: usize = BLOCK_SIZE - 4;

/// Errors that can occur when building or updating the memory image
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    AccessBits(#[from] AccessBitsIntegrityViolation),

    #[error("Block count mismatch: sector has {expected} blocks, read delivered {actual}")]
    BlockCountMismatch { expected: usize, actual: usize },

    #[error("Block address mismatch: expected block {expected}, got {actual}")]
    BlockAddressMismatch { expected: BlockAddress, actual: BlockAddress },

    #[error("Unsupported card subtype: {0:?}")]
    UnsupportedSubtype(PiccType),

    #[error("Invalid UID length: {0}")]
    InvalidUidLength(usize),

    #[error("Sector {0} out of range")]
    SectorOutOfRange(usize),

    #[error("Invalid payload length for block {address}: expected 16 bytes, got {length}")]
    InvalidPayloadLength { address: BlockAddress, length: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memory {
    picc_type: PiccType,
    uid_length: usize,
    sectors: Vec<Sector>,
}

impl Memory {
    /// Create the memory image of a card subtype
    ///
    /// Fails with [`MemoryError::UnsupportedSubtype`] for anything but
    /// MIFARE Classic Mini, 1K and 4K.
    pub fn new(picc_type: PiccType) -> Result<Self, MemoryError> {
        Self::with_uid_length(picc_type, DEFAULT_UID_LENGTH)
    }

    /// Create the memory image of an announced card
    pub fn for_picc(picc: &Picc) -> Result<Self, MemoryError> {
        Self::with_uid_length(picc.picc_type, picc.uid.len())
    }

    pub fn with_uid_length(picc_type: PiccType, uid_length: usize) -> Result<Self, MemoryError> {
        let sector_count = geometry::sector_count(picc_type)?;
        if uid_length == 0 || uid_length > MAX_UID_LENGTH {
            return Err(MemoryError::InvalidUidLength(uid_length));
        }

        let sectors = (0..sector_count)
            .map(|index| Sector::new(index, uid_length))
            .collect();

        debug!("Created {:?} memory with {} sectors", picc_type, sector_count);
        Ok(Self {
            picc_type,
            uid_length,
            sectors,
        })
    }

    pub fn picc_type(&self) -> PiccType {
        self.picc_type
    }

    pub fn uid_length(&self) -> usize {
        self.uid_length
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector(&self, index: usize) -> Option<&Sector> {
        self.sectors.get(index)
    }

    pub fn sector_mut(&mut self, index: usize) -> Option<&mut Sector> {
        self.sectors.get_mut(index)
    }

    /// Sector holding a block address
    pub fn sector_of(&self, address: BlockAddress) -> Option<&Sector> {
        self.sectors.get(geometry::sector_index_of(address))
    }

    /// Position of a sector in this memory, compared by index
    pub fn offset_of_sector(&self, sector: &Sector) -> Option<usize> {
        self.sectors.iter().position(|s| s.index() == sector.index())
    }

    pub fn block_at_address(&self, address: BlockAddress) -> Option<&Block> {
        self.sector_of(address)?
            .block_at_offset(geometry::block_offset(address))
    }

    /// Memory size in bytes
    pub fn size(&self) -> usize {
        self.sectors.iter().map(|s| s.block_count() * BLOCK_SIZE).sum()
    }

    /// True if no sector has been read
    pub fn is_empty(&self) -> bool {
        self.sectors.iter().all(Sector::is_empty)
    }

    /// Route a sector read to its sector
    pub fn apply_read(&mut self, read: &SectorRead) -> Result<(), MemoryError> {
        let sector = self
            .sectors
            .get_mut(read.offset)
            .ok_or(MemoryError::SectorOutOfRange(read.offset))?;
        sector.apply_read(read.key, &read.blocks)
    }

    /// Deauthenticate every sector, e.g. when the card leaves the field
    pub fn deauthenticate_all(&mut self) {
        for sector in &mut self.sectors {
            sector.deauthenticate();
        }
        info!("All sectors deauthenticated");
    }
}

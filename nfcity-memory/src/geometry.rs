//! Card geometry
//!
//! Address arithmetic for MIFARE Classic memory. Sectors 0..32 hold 4
//! blocks each (128 blocks); sectors 32..40, only present on 4K cards,
//! hold 16 blocks each.

use crate::memory::MemoryError;
use crate::picc::PiccType;

/// Card-global block index
pub type BlockAddress = u16;

/// Size of a block in bytes
pub const BLOCK_SIZE: usize = 16;

/// Number of sectors with 4 blocks
const SMALL_SECTORS: usize = 32;
const SMALL_SECTOR_BLOCKS: usize = 4;
const LARGE_SECTOR_BLOCKS: usize = 16;
/// Address of the first block of sector 32
const LARGE_REGION_START: BlockAddress = (SMALL_SECTORS * SMALL_SECTOR_BLOCKS) as BlockAddress;

/// Number of sectors on a card of the given subtype
pub fn sector_count(picc_type: PiccType) -> Result<usize, MemoryError> {
    match picc_type {
        PiccType::MifareMini => Ok(5),
        PiccType::Mifare1K => Ok(16),
        PiccType::Mifare4K => Ok(40),
        other => Err(MemoryError::UnsupportedSubtype(other)),
    }
}

/// Number of blocks in a sector
pub fn blocks_in_sector(sector: usize) -> usize {
    if sector < SMALL_SECTORS {
        SMALL_SECTOR_BLOCKS
    } else {
        LARGE_SECTOR_BLOCKS
    }
}

/// Address of the first block of a sector
pub fn block0_address(sector: usize) -> BlockAddress {
    if sector < SMALL_SECTORS {
        (sector * SMALL_SECTOR_BLOCKS) as BlockAddress
    } else {
        LARGE_REGION_START + ((sector - SMALL_SECTORS) * LARGE_SECTOR_BLOCKS) as BlockAddress
    }
}

/// Index of the sector holding a block
pub fn sector_index_of(address: BlockAddress) -> usize {
    if address < LARGE_REGION_START {
        address as usize / SMALL_SECTOR_BLOCKS
    } else {
        SMALL_SECTORS + (address - LARGE_REGION_START) as usize / LARGE_SECTOR_BLOCKS
    }
}

/// Offset of a block within its sector
pub fn block_offset(address: BlockAddress) -> usize {
    (address - block0_address(sector_index_of(address))) as usize
}

/// Check if a block is the last block (trailer) of its sector
pub fn is_sector_trailer(address: BlockAddress) -> bool {
    let sector = sector_index_of(address);
    block_offset(address) == blocks_in_sector(sector) - 1
}

/// Index into the trailer's access pool governing the block at `offset`
///
/// In 4-block sectors every block has its own slot. In 16-block sectors
/// slots 0..3 each govern a group of five blocks and slot 3 the trailer.
///
/// # Panics
///
/// Panics if the offset does not map into the 4-slot pool, which means
/// the caller passed an offset outside the sector.
pub fn access_pool_slot(offset: usize, blocks: usize) -> usize {
    let slot = if blocks <= SMALL_SECTOR_BLOCKS {
        offset
    } else {
        offset / 5
    };

    assert!(slot <= 3, "access pool slot {} out of range (offset {}, {} blocks)", slot, offset, blocks);
    slot
}

/// Sector layout as `(sectors, blocks per sector)` groups
pub fn block_distribution(picc_type: PiccType) -> Result<Vec<(usize, usize)>, MemoryError> {
    let sectors = sector_count(picc_type)?;
    let small = sectors.min(SMALL_SECTORS);
    let mut distribution = vec![(small, SMALL_SECTOR_BLOCKS)];
    if sectors > SMALL_SECTORS {
        distribution.push((sectors - SMALL_SECTORS, LARGE_SECTOR_BLOCKS));
    }
    Ok(distribution)
}

/// Total number of blocks on the card
pub fn block_count(picc_type: PiccType) -> Result<usize, MemoryError> {
    Ok(block_distribution(picc_type)?
        .iter()
        .map(|(sectors, blocks)| sectors * blocks)
        .sum())
}

/// Total memory size in bytes
pub fn memory_size(picc_type: PiccType) -> Result<usize, MemoryError> {
    Ok(block_count(picc_type)? * BLOCK_SIZE)
}

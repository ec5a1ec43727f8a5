//! Sector state
//!
//! A sector owns its blocks and the key it was last authenticated with.
//! Its block list only ever changes as a whole: [`Sector::apply_read`]
//! builds every new block before swapping them in, and
//! [`Sector::deauthenticate`] swaps in fresh undefined blocks.

use log::{debug, info, warn};
use serde::Serialize;

use super::{MemoryError, RawBlock};
use crate::access::AccessPool;
use crate::block::{Block, ByteGroup};
use crate::geometry::{access_pool_slot, block0_address, blocks_in_sector, BlockAddress};
use crate::picc::Key;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sector {
    index: usize,
    blocks: Vec<Block>,
    #[serde(skip)]
    key: Option<Key>,
    #[serde(skip)]
    uid_length: usize,
}

impl Sector {
    /// Create a sector with every block undefined
    pub(crate) fn new(index: usize, uid_length: usize) -> Self {
        Self {
            index,
            blocks: Self::undefined_blocks(index),
            key: None,
            uid_length,
        }
    }

    fn undefined_blocks(index: usize) -> Vec<Block> {
        let block0 = block0_address(index);
        (0..blocks_in_sector(index))
            .map(|offset| Block::undefined(block0 + offset as BlockAddress, offset))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn block0_address(&self) -> BlockAddress {
        block0_address(self.index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn trailer_offset(&self) -> usize {
        self.blocks.len() - 1
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_at_offset(&self, offset: usize) -> Option<&Block> {
        self.blocks.get(offset)
    }

    pub fn trailer(&self) -> &Block {
        &self.blocks[self.trailer_offset()]
    }

    /// Access pool of the trailer, once the sector has been read
    pub fn access_pool(&self) -> Option<&AccessPool> {
        self.trailer().access_pool()
    }

    /// Block owning a byte group of this sector
    pub fn group_block(&self, group: &ByteGroup) -> Option<&Block> {
        self.blocks.get(group.block())
    }

    /// Key used for the last successful read
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.key.is_some()
    }

    /// True if none of the blocks is loaded
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| !block.loaded())
    }

    /// Replace every block from a fresh read of the sector
    ///
    /// Either all blocks are retyped and `key` is recorded, or nothing
    /// changes and an error is returned.
    pub fn apply_read(&mut self, key: Key, raw_blocks: &[RawBlock]) -> Result<(), MemoryError> {
        if raw_blocks.len() != self.blocks.len() {
            warn!(
                "Sector {}: expected {} blocks, got {}",
                self.index,
                self.blocks.len(),
                raw_blocks.len()
            );
            return Err(MemoryError::BlockCountMismatch {
                expected: self.blocks.len(),
                actual: raw_blocks.len(),
            });
        }

        for (block, raw) in self.blocks.iter().zip(raw_blocks) {
            if block.address() != raw.address {
                warn!("Sector {}: block {} delivered as {}", self.index, block.address(), raw.address);
                return Err(MemoryError::BlockAddressMismatch {
                    expected: block.address(),
                    actual: raw.address,
                });
            }
        }

        let trailer_offset = self.trailer_offset();
        let trailer = Block::sector_trailer(&raw_blocks[trailer_offset], trailer_offset).map_err(|e| {
            warn!("Sector {}: {}", self.index, e);
            e
        })?;
        let Some(&access_pool) = trailer.access_pool() else {
            unreachable!("sector trailer built without access pool");
        };

        let block_count = self.blocks.len();
        let mut blocks: Vec<Block> = raw_blocks[..trailer_offset]
            .iter()
            .enumerate()
            .map(|(offset, raw)| {
                let access_bits = access_pool[access_pool_slot(offset, block_count)];
                Block::classify(raw, offset, access_bits, self.uid_length)
            })
            .collect();
        blocks.push(trailer);

        debug!(
            "Sector {} read with key {:?}: {}",
            self.index,
            key.key_type,
            blocks.iter().map(|b| b.role().name()).collect::<Vec<_>>().join(", ")
        );

        self.blocks = blocks;
        self.key = Some(key);
        Ok(())
    }

    /// Forget the key and every payload
    pub fn deauthenticate(&mut self) {
        if self.key.is_some() {
            info!("Sector {} deauthenticated", self.index);
        }
        self.key = None;
        self.blocks = Self::undefined_blocks(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{encode, AccessCombo, TRANSPORT_ACCESS_BITS};
    use crate::block::{BlockRole, GroupKind};
    use crate::geometry::BLOCK_SIZE;
    use crate::picc::{KeyType, DEFAULT_KEY};

    fn trailer(address: BlockAddress, access_bits: [u8; 3]) -> RawBlock {
        let mut payload = [0xFFu8; BLOCK_SIZE];
        payload[6..9].copy_from_slice(&access_bits);
        payload[9] = 0x00;
        RawBlock::new(address, payload)
    }

    fn read_for(sector: &Sector, access_bits: [u8; 3]) -> Vec<RawBlock> {
        let block0 = sector.block0_address();
        let mut blocks: Vec<RawBlock> = (0..sector.trailer_offset())
            .map(|offset| {
                let address = block0 + offset as BlockAddress;
                RawBlock::new(address, [address as u8; BLOCK_SIZE])
            })
            .collect();
        blocks.push(trailer(block0 + sector.trailer_offset() as BlockAddress, access_bits));
        blocks
    }

    fn access_bits(combos: [u8; 4]) -> [u8; 3] {
        encode(&AccessPool::from_combos(combos.map(AccessCombo::new))).unwrap()
    }

    #[test]
    fn test_new_sector_is_undefined() {
        let sector = Sector::new(1, 4);
        assert_eq!(sector.block_count(), 4);
        assert_eq!(sector.block0_address(), 4);
        assert!(sector.is_empty());
        assert!(!sector.is_authenticated());
        assert!(sector.access_pool().is_none());
        assert!(sector.blocks().iter().all(|b| b.role() == &BlockRole::Undefined));
    }

    #[test]
    fn test_apply_read() {
        let mut sector = Sector::new(1, 4);
        let raw = read_for(&sector, access_bits([0b000, 0b001, 0b110, 0b001]));
        sector.apply_read(DEFAULT_KEY, &raw).unwrap();

        assert!(sector.is_authenticated());
        assert_eq!(sector.key(), Some(&DEFAULT_KEY));
        assert!(!sector.is_empty());
        assert_eq!(sector.blocks()[0].role(), &BlockRole::Data);
        assert_eq!(sector.blocks()[1].role(), &BlockRole::Value);
        assert_eq!(sector.blocks()[2].role(), &BlockRole::Value);
        assert!(sector.trailer().is_sector_trailer());
        assert_eq!(sector.blocks()[1].data(), &[5u8; BLOCK_SIZE]);
    }

    #[test]
    fn test_short_read_leaves_sector_unchanged() {
        let mut sector = Sector::new(2, 4);
        let raw = read_for(&sector, TRANSPORT_ACCESS_BITS);
        sector.apply_read(DEFAULT_KEY, &raw).unwrap();
        let before = sector.clone();

        let other_key = Key::new(KeyType::B, [0x00; 6]);
        let result = sector.apply_read(other_key, &raw[1..]);
        assert!(matches!(
            result,
            Err(MemoryError::BlockCountMismatch { expected: 4, actual: 3 })
        ));
        assert_eq!(sector, before);
        assert_eq!(sector.key(), Some(&DEFAULT_KEY));
    }

    #[test]
    fn test_integrity_violation_leaves_sector_unchanged() {
        let mut sector = Sector::new(0, 4);
        let raw = read_for(&sector, [0xFF, 0x00, 0x00]);
        let result = sector.apply_read(DEFAULT_KEY, &raw);
        assert!(matches!(result, Err(MemoryError::AccessBits(_))));
        assert!(sector.is_empty());
        assert!(!sector.is_authenticated());
    }

    #[test]
    fn test_address_mismatch_rejected() {
        let mut sector = Sector::new(1, 4);
        let mut raw = read_for(&sector, TRANSPORT_ACCESS_BITS);
        raw.swap(0, 1);
        assert!(matches!(
            sector.apply_read(DEFAULT_KEY, &raw),
            Err(MemoryError::BlockAddressMismatch { expected: 4, actual: 5 })
        ));
        assert!(sector.is_empty());
    }

    #[test]
    fn test_large_sector_pool_slots() {
        // slot 0: value, slot 1: data, slot 2: value, trailer: transport
        let mut sector = Sector::new(32, 4);
        assert_eq!(sector.block_count(), 16);
        let raw = read_for(&sector, access_bits([0b110, 0b000, 0b001, 0b001]));
        sector.apply_read(DEFAULT_KEY, &raw).unwrap();

        let roles: Vec<_> = sector.blocks().iter().map(|b| b.role().name()).collect();
        assert_eq!(&roles[0..5], &["Value"; 5]);
        assert_eq!(&roles[5..10], &["Data"; 5]);
        assert_eq!(&roles[10..15], &["Value"; 5]);
        assert_eq!(roles[15], "SectorTrailer");
    }

    #[test]
    fn test_deauthenticate_idempotent() {
        let mut sector = Sector::new(3, 4);
        let raw = read_for(&sector, TRANSPORT_ACCESS_BITS);
        sector.apply_read(DEFAULT_KEY, &raw).unwrap();

        sector.deauthenticate();
        let once = sector.clone();
        sector.deauthenticate();

        assert_eq!(sector, once);
        assert_eq!(sector, Sector::new(3, 4));
        assert!(sector.key().is_none());
        assert_eq!(sector.blocks()[0].address(), 12);
    }

    #[test]
    fn test_group_block_resolves_arena_index() {
        let mut sector = Sector::new(1, 4);
        let raw = read_for(&sector, TRANSPORT_ACCESS_BITS);
        sector.apply_read(DEFAULT_KEY, &raw).unwrap();

        let trailer = sector.trailer();
        let key_b = trailer.find_group(GroupKind::KeyB).unwrap();
        let owner = sector.group_block(key_b.group()).unwrap();
        assert_eq!(owner.address(), 7);
        assert!(owner.has_same_address_as(trailer));
    }
}

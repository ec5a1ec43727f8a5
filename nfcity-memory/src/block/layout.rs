//! Byte group layouts per block role
//!
//! Every layout covers all 16 bytes of the block, in order, without gaps.

use super::group::{ByteGroup, GroupKind};
use crate::access::conditions::{
    DATA_TABLE, MANUFACTURER_TABLE, TRAILER_ACCESS_BITS_TABLE, TRAILER_KEY_A_TABLE,
    TRAILER_KEY_B_TABLE, VALUE_TABLE,
};
use crate::geometry::BLOCK_SIZE;

pub(crate) fn undefined(block: usize) -> Vec<ByteGroup> {
    vec![ByteGroup::new(GroupKind::Undefined, 0, BLOCK_SIZE, None, block)]
}

pub(crate) fn sector_trailer(block: usize) -> Vec<ByteGroup> {
    vec![
        ByteGroup::new(GroupKind::KeyA, 0, 6, Some(&TRAILER_KEY_A_TABLE), block),
        ByteGroup::new(GroupKind::AccessBits, 6, 3, Some(&TRAILER_ACCESS_BITS_TABLE), block),
        ByteGroup::new(GroupKind::UserByte, 9, 1, Some(&TRAILER_ACCESS_BITS_TABLE), block),
        ByteGroup::new(GroupKind::KeyB, 10, 6, Some(&TRAILER_KEY_B_TABLE), block),
    ]
}

/// Layout of block 0; the UID length depends on the card (4, 7 or 10 bytes)
pub(crate) fn manufacturer(block: usize, uid_length: usize) -> Vec<ByteGroup> {
    let table = Some(&MANUFACTURER_TABLE);
    let u = uid_length;
    vec![
        ByteGroup::new(GroupKind::Uid, 0, u, table, block),
        ByteGroup::new(GroupKind::Bcc, u, 1, table, block),
        ByteGroup::new(GroupKind::Sak, u + 1, 1, table, block),
        ByteGroup::new(GroupKind::Atqa, u + 2, 2, table, block),
        ByteGroup::new(GroupKind::ManufacturerData, u + 4, BLOCK_SIZE - u - 4, table, block),
    ]
}

pub(crate) fn data(block: usize) -> Vec<ByteGroup> {
    vec![ByteGroup::new(GroupKind::Data, 0, BLOCK_SIZE, Some(&DATA_TABLE), block)]
}

pub(crate) fn value(block: usize) -> Vec<ByteGroup> {
    let table = Some(&VALUE_TABLE);
    vec![
        ByteGroup::new(GroupKind::Value, 0, 4, table, block),
        ByteGroup::new(GroupKind::ValueInverted, 4, 4, table, block),
        ByteGroup::new(GroupKind::Value, 8, 4, table, block),
        ByteGroup::new(GroupKind::Address, 12, 1, table, block),
        ByteGroup::new(GroupKind::AddressInverted, 13, 1, table, block),
        ByteGroup::new(GroupKind::Address, 14, 1, table, block),
        ByteGroup::new(GroupKind::AddressInverted, 15, 1, table, block),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers_block(groups: &[ByteGroup]) {
        let mut next = 0;
        for group in groups {
            assert_eq!(group.offset(), next, "gap before {:?}", group.kind());
            next += group.length();
        }
        assert_eq!(next, BLOCK_SIZE);
    }

    #[test]
    fn test_layouts_cover_block() {
        assert_covers_block(&undefined(0));
        assert_covers_block(&sector_trailer(3));
        assert_covers_block(&data(1));
        assert_covers_block(&value(2));
        for uid_length in [4, 7, 10] {
            assert_covers_block(&manufacturer(0, uid_length));
        }
    }

    #[test]
    fn test_manufacturer_layout() {
        let groups = manufacturer(0, 7);
        let kinds: Vec<_> = groups.iter().map(|g| (g.kind(), g.offset(), g.length())).collect();
        assert_eq!(
            kinds,
            vec![
                (GroupKind::Uid, 0, 7),
                (GroupKind::Bcc, 7, 1),
                (GroupKind::Sak, 8, 1),
                (GroupKind::Atqa, 9, 2),
                (GroupKind::ManufacturerData, 11, 5),
            ]
        );
    }

    #[test]
    fn test_groups_bound_to_block() {
        assert!(sector_trailer(15).iter().all(|g| g.block() == 15));
        assert!(undefined(2)[0].table().is_none());
        assert!(data(2)[0].table().is_some());
    }
}

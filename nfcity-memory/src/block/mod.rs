//! Blocks and their roles
//!
//! A block starts out [`BlockRole::Undefined`] and takes one of the other
//! roles when its sector is read. The role decides the block's byte
//! groups and the permission tables they are checked against.

mod group;
mod layout;
mod value;

pub use group::{ByteGroup, GroupKind, GroupRef};
pub use value::ValueBlock;

use serde::Serialize;

use crate::access::{
    combo_of, decode, is_value_combo, AccessBitsIntegrityViolation, AccessCombo, AccessPool, AccessTriple,
    Operation,
};
use crate::geometry::{BlockAddress, BLOCK_SIZE};
use crate::memory::RawBlock;
use crate::picc::Key;

/// Role of a block within its sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockRole {
    /// Not read yet (or deauthenticated)
    Undefined,
    /// Last block of a sector: keys and access bits
    SectorTrailer { access_pool: AccessPool },
    Data,
    Value,
    /// Block 0 of the card
    Manufacturer,
}

impl BlockRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::SectorTrailer { .. } => "SectorTrailer",
            Self::Data => "Data",
            Self::Value => "Value",
            Self::Manufacturer => "Manufacturer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    address: BlockAddress,
    #[serde(serialize_with = "crate::hex::hex_payload::serialize")]
    payload: Option<[u8; BLOCK_SIZE]>,
    role: BlockRole,
    groups: Vec<ByteGroup>,
    access_combo: AccessCombo,
}

impl Block {
    /// Create an unread block; `index` is its offset within the sector
    pub(crate) fn undefined(address: BlockAddress, index: usize) -> Self {
        Self {
            address,
            payload: None,
            role: BlockRole::Undefined,
            groups: layout::undefined(index),
            access_combo: AccessCombo::default(),
        }
    }

    /// Build a sector trailer, decoding its access bits (bytes 6..=8)
    pub(crate) fn sector_trailer(raw: &RawBlock, index: usize) -> Result<Self, AccessBitsIntegrityViolation> {
        let access_pool = decode(raw.payload[6], raw.payload[7], raw.payload[8])?;
        Ok(Self {
            address: raw.address,
            payload: Some(raw.payload),
            role: BlockRole::SectorTrailer { access_pool },
            groups: layout::sector_trailer(index),
            access_combo: combo_of(access_pool.trailer()),
        })
    }

    /// Build a non-trailer block governed by `access_bits`
    ///
    /// Block 0 is always the manufacturer block; otherwise the value
    /// block combos select [`BlockRole::Value`] and anything else is data.
    pub(crate) fn classify(raw: &RawBlock, index: usize, access_bits: AccessTriple, uid_length: usize) -> Self {
        let access_combo = combo_of(access_bits);
        let (role, groups) = if raw.address == 0 {
            (BlockRole::Manufacturer, layout::manufacturer(index, uid_length))
        } else if is_value_combo(access_combo) {
            (BlockRole::Value, layout::value(index))
        } else {
            (BlockRole::Data, layout::data(index))
        };

        Self {
            address: raw.address,
            payload: Some(raw.payload),
            role,
            groups,
            access_combo,
        }
    }

    pub fn address(&self) -> BlockAddress {
        self.address
    }

    pub fn role(&self) -> &BlockRole {
        &self.role
    }

    pub fn payload(&self) -> Option<&[u8; BLOCK_SIZE]> {
        self.payload.as_ref()
    }

    /// Block bytes, empty while not loaded
    pub fn data(&self) -> &[u8] {
        self.payload.as_ref().map(|p| p.as_slice()).unwrap_or(&[])
    }

    pub fn loaded(&self) -> bool {
        self.payload.is_some()
    }

    pub fn access_combo(&self) -> AccessCombo {
        self.access_combo
    }

    pub fn access_bits(&self) -> AccessTriple {
        self.access_combo.into()
    }

    /// Decoded access pool, only present on sector trailers
    pub fn access_pool(&self) -> Option<&AccessPool> {
        match &self.role {
            BlockRole::SectorTrailer { access_pool } => Some(access_pool),
            _ => None,
        }
    }

    pub fn is_sector_trailer(&self) -> bool {
        matches!(self.role, BlockRole::SectorTrailer { .. })
    }

    pub fn groups(&self) -> &[ByteGroup] {
        &self.groups
    }

    pub fn group_refs(&self) -> impl Iterator<Item = GroupRef<'_>> {
        self.groups.iter().map(move |group| GroupRef::new(self, group))
    }

    /// First group of the given kind
    pub fn find_group(&self, kind: GroupKind) -> Option<GroupRef<'_>> {
        self.group_refs().find(|group| group.kind() == kind)
    }

    pub fn has_same_address_as(&self, other: &Block) -> bool {
        self.address == other.address
    }

    /// Check if the key may write at least one group (trailers: a key, the access bits or the user byte)
    pub fn key_can_write_to_any_group(&self, key: &Key) -> bool {
        self.group_refs().any(|group| group.key_can(key, Operation::Write))
    }

    /// Decoded value, for well-formed value blocks only
    pub fn value(&self) -> Option<ValueBlock> {
        match (&self.role, &self.payload) {
            (BlockRole::Value, Some(payload)) => ValueBlock::from_bytes(payload),
            _ => None,
        }
    }
}

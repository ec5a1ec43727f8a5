//! Byte groups
//!
//! A byte group is a named sub-range of a block's 16 bytes, the unit at
//! which access conditions are evaluated.

use std::ops::Range;

use serde::Serialize;

use super::Block;
use crate::access::{allowed_operations, key_can, Operation, PermissionTable};
use crate::picc::Key;

/// What a byte group holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKind {
    Undefined,
    // sector trailer
    KeyA,
    AccessBits,
    UserByte,
    KeyB,
    // manufacturer block
    Uid,
    Bcc,
    Sak,
    Atqa,
    ManufacturerData,
    // data block
    Data,
    // value block
    Value,
    ValueInverted,
    Address,
    AddressInverted,
}

impl GroupKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined",
            Self::KeyA => "KeyA",
            Self::AccessBits => "AccessBits",
            Self::UserByte => "UserByte",
            Self::KeyB => "KeyB",
            Self::Uid => "UID",
            Self::Bcc => "BCC",
            Self::Sak => "SAK",
            Self::Atqa => "ATQA",
            Self::ManufacturerData => "ManufacturerData",
            Self::Data => "Data",
            Self::Value => "Value",
            Self::ValueInverted => "ValueInverted",
            Self::Address => "Address",
            Self::AddressInverted => "AddressInverted",
        }
    }
}

/// A named byte range of a block
///
/// `block` is the offset of the owning block inside its sector, fixed
/// when the block is built. Resolve it with
/// [`Sector::group_block`](crate::memory::Sector::group_block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteGroup {
    kind: GroupKind,
    offset: usize,
    length: usize,
    #[serde(skip)]
    table: Option<&'static PermissionTable>,
    #[serde(skip)]
    block: usize,
}

impl ByteGroup {
    pub(crate) fn new(
        kind: GroupKind,
        offset: usize,
        length: usize,
        table: Option<&'static PermissionTable>,
        block: usize,
    ) -> Self {
        Self {
            kind,
            offset,
            length,
            table,
            block,
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Permission table, `None` for groups of undefined blocks
    pub fn table(&self) -> Option<&'static PermissionTable> {
        self.table
    }

    /// Offset of the owning block within its sector
    pub fn block(&self) -> usize {
        self.block
    }

    pub fn has_same_kind_as(&self, other: &ByteGroup) -> bool {
        self.kind == other.kind
    }
}

/// A byte group together with the block it belongs to
#[derive(Debug, Clone, Copy)]
pub struct GroupRef<'a> {
    block: &'a Block,
    group: &'a ByteGroup,
}

impl<'a> GroupRef<'a> {
    pub(crate) fn new(block: &'a Block, group: &'a ByteGroup) -> Self {
        Self { block, group }
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    pub fn group(&self) -> &'a ByteGroup {
        self.group
    }

    pub fn kind(&self) -> GroupKind {
        self.group.kind
    }

    /// Bytes covered by the group, empty while the block is not loaded
    pub fn data(&self) -> &'a [u8] {
        match self.block.payload() {
            Some(payload) => &payload[self.group.range()],
            None => &[],
        }
    }

    pub fn key_can(&self, key: &Key, operation: Operation) -> bool {
        self.group
            .table
            .map(|table| key_can(table, key.key_type, operation, self.block.access_combo()))
            .unwrap_or(false)
    }

    pub fn allowed_operations_for(&self, key: &Key) -> Vec<Operation> {
        self.group
            .table
            .map(|table| allowed_operations(table, key.key_type, self.block.access_combo()))
            .unwrap_or_default()
    }

    /// Same byte range of the same block
    pub fn is_same_as(&self, other: &GroupRef<'_>) -> bool {
        self.block.has_same_address_as(other.block)
            && self.group.offset == other.group.offset
            && self.group.length == other.group.length
    }
}

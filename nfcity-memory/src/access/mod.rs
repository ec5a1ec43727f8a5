//! Sector trailer access control
//!
//! [`bits`] decodes the redundant access bits field of a sector trailer
//! into an [`AccessPool`]; [`conditions`] maps a block's combo and a
//! presented key onto the operations it may perform.

pub mod bits;
pub mod conditions;

pub use bits::{
    combo_of, decode, encode, triple_of, AccessBitsIntegrityViolation, AccessCombo, AccessPool,
    AccessTriple, POOL_SLOTS, TRANSPORT_ACCESS_BITS,
};
pub use conditions::{
    allowed_operations, is_value_combo, key_can, key_type_permissions, ComboSet, Grant, Operation,
    PermissionTable,
};

/// Default combo of a data block on a factory-fresh card
pub const DATA_BLOCK_DEFAULT_COMBO: AccessCombo = AccessCombo::new(0b000);

/// Default combo of a sector trailer on a factory-fresh card
pub const SECTOR_TRAILER_DEFAULT_COMBO: AccessCombo = AccessCombo::new(0b001);

//! Access conditions
//!
//! Static permission tables per block role, following the MIFARE Classic
//! access condition tables, and the evaluator answering which key may
//! perform which operation under a given combo.

use serde::Serialize;

use super::bits::AccessCombo;
use crate::picc::KeyType;

/// Block operations guarded by access conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Increment,
    Decrement,
    Transfer,
    Restore,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::Read,
        Self::Write,
        Self::Increment,
        Self::Decrement,
        Self::Transfer,
        Self::Restore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Transfer => "transfer",
            Self::Restore => "restore",
        }
    }

    /// One-letter label (`R` for restore, to tell it apart from read)
    pub fn short_name(self) -> char {
        match self {
            Self::Read => 'r',
            Self::Write => 'w',
            Self::Increment => 'i',
            Self::Decrement => 'd',
            Self::Transfer => 't',
            Self::Restore => 'R',
        }
    }
}

/// Set of access combos, one bit per combo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComboSet(u8);

impl ComboSet {
    pub const NONE: ComboSet = ComboSet(0);
    pub const ALL: ComboSet = ComboSet(0xFF);

    pub const fn of(combos: &[u8]) -> Self {
        let mut mask = 0u8;
        let mut i = 0;
        while i < combos.len() {
            mask |= 1 << (combos[i] & 0b111);
            i += 1;
        }
        Self(mask)
    }

    pub const fn contains(self, combo: AccessCombo) -> bool {
        self.0 & (1 << combo.bits()) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = AccessCombo> {
        AccessCombo::ALL.into_iter().filter(move |combo| self.contains(*combo))
    }
}

/// Combos under which each key type may perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub key_a: ComboSet,
    pub key_b: ComboSet,
}

impl Grant {
    pub const fn new(key_a: ComboSet, key_b: ComboSet) -> Self {
        Self { key_a, key_b }
    }

    pub const fn both(combos: ComboSet) -> Self {
        Self { key_a: combos, key_b: combos }
    }

    pub const fn never() -> Self {
        Self::both(ComboSet::NONE)
    }

    pub fn for_key(&self, key_type: KeyType) -> ComboSet {
        match key_type {
            KeyType::A => self.key_a,
            KeyType::B => self.key_b,
        }
    }
}

/// Permission table of one block role or trailer field
///
/// An operation without a grant is not defined for the role and is
/// never permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionTable {
    pub read: Option<Grant>,
    pub write: Option<Grant>,
    pub increment: Option<Grant>,
    pub decrement: Option<Grant>,
    pub transfer: Option<Grant>,
    pub restore: Option<Grant>,
}

impl PermissionTable {
    pub const EMPTY: PermissionTable = PermissionTable {
        read: None,
        write: None,
        increment: None,
        decrement: None,
        transfer: None,
        restore: None,
    };

    pub fn grant(&self, operation: Operation) -> Option<&Grant> {
        match operation {
            Operation::Read => self.read.as_ref(),
            Operation::Write => self.write.as_ref(),
            Operation::Increment => self.increment.as_ref(),
            Operation::Decrement => self.decrement.as_ref(),
            Operation::Transfer => self.transfer.as_ref(),
            Operation::Restore => self.restore.as_ref(),
        }
    }

    /// Operations this table defines, in declaration order
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.grant(*op).is_some())
    }
}

pub static MANUFACTURER_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::both(ComboSet::ALL)),
    write: Some(Grant::never()),
    ..PermissionTable::EMPTY
};

pub static DATA_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::new(
        ComboSet::of(&[0b000, 0b010, 0b100, 0b110, 0b001]),
        ComboSet::of(&[0b000, 0b010, 0b100, 0b110, 0b001, 0b011, 0b101]),
    )),
    write: Some(Grant::new(
        ComboSet::of(&[0b000]),
        ComboSet::of(&[0b000, 0b100, 0b110, 0b011]),
    )),
    increment: Some(Grant::new(ComboSet::of(&[0b000]), ComboSet::of(&[0b000, 0b110]))),
    decrement: Some(Grant::both(ComboSet::of(&[0b000, 0b110, 0b001]))),
    transfer: Some(Grant::both(ComboSet::of(&[0b000, 0b110, 0b001]))),
    restore: Some(Grant::both(ComboSet::of(&[0b000, 0b110, 0b001]))),
};

const VALUE_COMBOS: ComboSet = ComboSet::of(&[0b110, 0b001]);

pub static VALUE_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::both(VALUE_COMBOS)),
    write: Some(Grant::new(ComboSet::NONE, ComboSet::of(&[0b110]))),
    increment: Some(Grant::new(ComboSet::NONE, ComboSet::of(&[0b110]))),
    decrement: Some(Grant::both(VALUE_COMBOS)),
    transfer: Some(Grant::both(VALUE_COMBOS)),
    restore: Some(Grant::both(VALUE_COMBOS)),
};

/// Sector trailer, key A field (never readable)
pub static TRAILER_KEY_A_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::never()),
    write: Some(Grant::new(ComboSet::of(&[0b000, 0b001]), ComboSet::of(&[0b100, 0b011]))),
    ..PermissionTable::EMPTY
};

/// Sector trailer, access bits and user byte fields
pub static TRAILER_ACCESS_BITS_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::new(
        ComboSet::ALL,
        ComboSet::of(&[0b100, 0b110, 0b011, 0b101, 0b111]),
    )),
    write: Some(Grant::new(ComboSet::of(&[0b001]), ComboSet::of(&[0b011, 0b101]))),
    ..PermissionTable::EMPTY
};

/// Sector trailer, key B field
pub static TRAILER_KEY_B_TABLE: PermissionTable = PermissionTable {
    read: Some(Grant::new(ComboSet::of(&[0b000, 0b010, 0b001]), ComboSet::NONE)),
    write: Some(Grant::new(ComboSet::of(&[0b000, 0b001]), ComboSet::of(&[0b100, 0b011]))),
    ..PermissionTable::EMPTY
};

/// Combos that turn a data block into a value block
pub fn is_value_combo(combo: AccessCombo) -> bool {
    VALUE_COMBOS.contains(combo)
}

/// Check if a key type may perform `operation` under `combo`
pub fn key_can(table: &PermissionTable, key_type: KeyType, operation: Operation, combo: AccessCombo) -> bool {
    table
        .grant(operation)
        .map(|grant| grant.for_key(key_type).contains(combo))
        .unwrap_or(false)
}

/// Every operation the table defines, paired with whether it is allowed
pub fn key_type_permissions(
    table: &PermissionTable,
    key_type: KeyType,
    combo: AccessCombo,
) -> Vec<(Operation, bool)> {
    table
        .operations()
        .map(|op| (op, key_can(table, key_type, op, combo)))
        .collect()
}

/// Operations a key type may perform under `combo`
pub fn allowed_operations(table: &PermissionTable, key_type: KeyType, combo: AccessCombo) -> Vec<Operation> {
    Operation::ALL
        .into_iter()
        .filter(|op| key_can(table, key_type, *op, combo))
        .collect()
}

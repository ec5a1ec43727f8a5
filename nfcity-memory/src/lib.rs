//! MIFARE Classic memory model
//!
//! Turns the raw 16-byte block payloads read from a MIFARE Classic card
//! (Mini, 1K or 4K) into a structured memory image:
//! - sector and block address arithmetic per card subtype
//! - decoding and validation of the sector trailer access bits
//! - classification of blocks into trailer, manufacturer, data and value roles
//! - "can key K perform operation O on this byte group" queries
//!
//! # Example
//! ```ignore
//! use nfcity_memory::{Memory, PiccType, SectorRead};
//!
//! let mut memory = Memory::new(PiccType::Mifare1K)?;
//! let read: SectorRead = serde_json::from_str(&event)?;
//! memory.apply_read(&read)?;
//!
//! let block = memory.block_at_address(0).unwrap();
//! for group in block.group_refs() {
//!     println!("{}: {:?}", group.kind().name(), group.allowed_operations_for(&read.key));
//! }
//! ```

pub mod access;
pub mod block;
pub mod config;
pub mod geometry;
pub mod hex;
pub mod memory;
pub mod picc;

pub use access::{AccessBitsIntegrityViolation, AccessCombo, AccessPool, AccessTriple, Operation};
pub use block::{Block, BlockRole, ByteGroup, GroupKind, GroupRef, ValueBlock};
pub use config::{ConfigError, KeyConfig};
pub use geometry::{BlockAddress, BLOCK_SIZE};
pub use memory::{Memory, MemoryError, RawBlock, Sector, SectorRead};
pub use picc::{Key, KeyError, KeyType, Picc, PiccState, PiccType, DEFAULT_KEY};

//! PICC (proximity card) identity and authentication keys
//!
//! The reader announces every card it selects as a [`Picc`]; the memory
//! model only needs its subtype and UID length, but the full identity is
//! kept so a re-presented card can be recognized.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::hex::{hex_array, hex_compact, unhex};

/// Size of a MIFARE Classic key in bytes
pub const KEY_SIZE: usize = 6;

/// Factory default key (key A, all ones)
pub const DEFAULT_KEY: Key = Key {
    key_type: KeyType::A,
    value: [0xFF; KEY_SIZE],
};

/// Card subtype as reported by the reader
///
/// Discriminants match the codes used on the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum PiccType {
    Unknown = -1,
    Undefined = 0,
    Iso14443_4 = 1,
    Iso18092 = 2,
    MifareMini = 3,
    Mifare1K = 4,
    Mifare4K = 5,
    MifareUltralight = 6,
    MifarePlus = 7,
    MifareDesfire = 8,
    Tnp3xxx = 9,
}

impl PiccType {
    /// Try to convert from a transport code
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Unknown),
            0 => Some(Self::Undefined),
            1 => Some(Self::Iso14443_4),
            2 => Some(Self::Iso18092),
            3 => Some(Self::MifareMini),
            4 => Some(Self::Mifare1K),
            5 => Some(Self::Mifare4K),
            6 => Some(Self::MifareUltralight),
            7 => Some(Self::MifarePlus),
            8 => Some(Self::MifareDesfire),
            9 => Some(Self::Tnp3xxx),
            _ => None,
        }
    }

    /// Check if the memory model supports this subtype
    pub fn is_mifare_classic(self) -> bool {
        matches!(self, Self::MifareMini | Self::Mifare1K | Self::Mifare4K)
    }
}

impl From<i8> for PiccType {
    fn from(code: i8) -> Self {
        Self::from_code(code).unwrap_or(Self::Unknown)
    }
}

impl From<PiccType> for i8 {
    fn from(picc_type: PiccType) -> Self {
        picc_type as i8
    }
}

/// ISO 14443-3 card state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum PiccState {
    PowerOff = -1,
    Idle = 0,
    Ready = 1,
    Active = 2,
    Halt = 3,
    ReadyH = 4,
    ActiveH = 5,
}

impl From<i8> for PiccState {
    fn from(code: i8) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::Ready,
            2 => Self::Active,
            3 => Self::Halt,
            4 => Self::ReadyH,
            5 => Self::ActiveH,
            _ => Self::PowerOff,
        }
    }
}

impl From<PiccState> for i8 {
    fn from(state: PiccState) -> Self {
        state as i8
    }
}

/// A card as announced by the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picc {
    #[serde(rename = "type")]
    pub picc_type: PiccType,
    pub state: PiccState,
    pub atqa: u16,
    pub sak: u8,
    pub uid: Vec<u8>,
}

impl Picc {
    /// Stable identity of the card (SHA-256 over type, ATQA, SAK and UID)
    ///
    /// The state is left out, so the same card keeps its fingerprint
    /// across halt/wake cycles.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update([i8::from(self.picc_type) as u8]);
        hasher.update(self.atqa.to_be_bytes());
        hasher.update([self.sak]);
        hasher.update(&self.uid);
        hex_compact(&hasher.finalize())
    }

    pub fn is_mifare_classic(&self) -> bool {
        self.picc_type.is_mifare_classic()
    }
}

/// Which of the two sector keys is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    A,
    B,
}

/// Errors that can occur when parsing a key
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key is not a valid hex string")]
    InvalidHex,

    #[error("Invalid key length: expected 6 bytes, got {0}")]
    InvalidLength(usize),
}

/// A sector key presented when authenticating
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    #[serde(with = "hex_array")]
    pub value: [u8; KEY_SIZE],
}

impl Key {
    pub fn new(key_type: KeyType, value: [u8; KEY_SIZE]) -> Self {
        Self { key_type, value }
    }

    /// Parse a key value from hex, e.g. `"A0A1A2A3A4A5"`
    pub fn from_hex(key_type: KeyType, s: &str) -> Result<Self, KeyError> {
        let bytes = unhex(s).ok_or(KeyError::InvalidHex)?;
        let value: [u8; KEY_SIZE] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength(bytes.len()))?;
        Ok(Self { key_type, value })
    }
}

// Key values are secrets; keep them out of debug logs.
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("key_type", &self.key_type)
            .field("value", &"******")
            .finish()
    }
}

impl Default for Key {
    fn default() -> Self {
        DEFAULT_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picc(uid: Vec<u8>) -> Picc {
        Picc {
            picc_type: PiccType::Mifare1K,
            state: PiccState::Active,
            atqa: 0x0004,
            sak: 0x08,
            uid,
        }
    }

    #[test]
    fn test_picc_type_codes() {
        assert_eq!(PiccType::from_code(4), Some(PiccType::Mifare1K));
        assert_eq!(PiccType::from_code(42), None);
        assert_eq!(PiccType::from(42), PiccType::Unknown);
        assert_eq!(i8::from(PiccType::Mifare4K), 5);
    }

    #[test]
    fn test_is_mifare_classic() {
        assert!(PiccType::MifareMini.is_mifare_classic());
        assert!(PiccType::Mifare1K.is_mifare_classic());
        assert!(PiccType::Mifare4K.is_mifare_classic());
        assert!(!PiccType::MifareUltralight.is_mifare_classic());
        assert!(!PiccType::Unknown.is_mifare_classic());
    }

    #[test]
    fn test_fingerprint_ignores_state() {
        let a = picc(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let mut b = a.clone();
        b.state = PiccState::Halt;
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = picc(vec![0xDE, 0xAD, 0xBE, 0xEE]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_picc_from_json() {
        let json = r#"{"type":3,"state":2,"atqa":4,"sak":9,"uid":[1,2,3,4]}"#;
        let picc: Picc = serde_json::from_str(json).unwrap();
        assert_eq!(picc.picc_type, PiccType::MifareMini);
        assert_eq!(picc.state, PiccState::Active);
        assert_eq!(picc.uid, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_key_from_hex() {
        let key = Key::from_hex(KeyType::B, "A0 A1 A2 A3 A4 A5").unwrap();
        assert_eq!(key.key_type, KeyType::B);
        assert_eq!(key.value, [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);

        assert_eq!(Key::from_hex(KeyType::A, "FFFF"), Err(KeyError::InvalidLength(2)));
        assert_eq!(Key::from_hex(KeyType::A, "not a key"), Err(KeyError::InvalidHex));
    }

    #[test]
    fn test_key_debug_hides_value() {
        let key = Key::new(KeyType::A, [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains("12"));
        assert!(debug.contains("******"));
    }

    #[test]
    fn test_key_json_round_trip() {
        let json = serde_json::to_string(&DEFAULT_KEY).unwrap();
        assert_eq!(json, r#"{"type":"A","value":"FFFFFFFFFFFF"}"#);
        let key: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(key, DEFAULT_KEY);
    }
}

//! Hex helpers
//!
//! Keys and block payloads travel as hex strings in config files and
//! memory dumps, e.g. `FF FF FF FF FF FF`.

/// Convert a byte slice to a spaced hex string
pub fn hexify(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// Convert a byte slice to a compact hex string (no separators)
pub fn hex_compact(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Parse a hex string into bytes
///
/// Whitespace is ignored. An odd number of digits is accepted, the last
/// digit being treated as the low nibble of the final byte (`"F"` -> `[0x0F]`).
/// Returns `None` if the string contains anything other than hex digits.
pub fn unhex(s: &str) -> Option<Vec<u8>> {
    let mut digits: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.chars().filter(|c| !c.is_whitespace()) {
        digits.push(c.to_digit(16)? as u8);
    }

    if digits.len() % 2 != 0 {
        let last = digits.len() - 1;
        digits.insert(last, 0);
    }

    Some(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

/// Serde adapter storing fixed-size byte arrays as compact hex strings
pub(crate) mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::hex_compact(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        let bytes = super::unhex(&s).ok_or_else(|| serde::de::Error::custom("invalid hex string"))?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::invalid_length(len, &"a fixed-size hex string"))
    }
}

/// Serde adapter for optional block payloads
pub(crate) mod hex_payload {
    use serde::Serializer;

    pub fn serialize<S>(bytes: &Option<[u8; 16]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_str(&super::hexify(bytes)),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexify() {
        assert_eq!(hexify(&[0xFF, 0x07, 0x80, 0x69]), "FF 07 80 69");
        assert_eq!(hexify(&[]), "");
        assert_eq!(hex_compact(&[0xA0, 0x0B]), "A00B");
    }

    #[test]
    fn test_unhex() {
        assert_eq!(unhex("FFFFFFFFFFFF"), Some(vec![0xFF; 6]));
        assert_eq!(unhex("a0 a1 a2"), Some(vec![0xA0, 0xA1, 0xA2]));
        assert_eq!(unhex(""), Some(vec![]));
        assert_eq!(unhex("ABC"), Some(vec![0xAB, 0x0C]));
        assert_eq!(unhex("zz"), None);
    }
}

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents a 128-bit Bluetooth UUID.
///
/// Internally, the UUID is always stored in little-endian byte order, which
/// is the order it takes in advertising data.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

/// The custom service advertised in the scan response:
/// 12345678-1234-5678-1234-56789abcdef0
pub const CUSTOM_SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef0);

/// The base UUID "00000000-0000-1000-8000-00805F9B34FB" (little-endian).
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset within the base UUID where a 16-bit value is inserted.
const BASE_OFFSET: usize = 12;

impl Uuid {
    /// Creates a UUID from its integer value, as written in hyphenated form
    pub const fn from_u128(value: u128) -> Self {
        Uuid {
            bytes: value.to_le_bytes(),
        }
    }

    /// Creates a new 128-bit UUID directly from 16 bytes (little-endian).
    pub const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Uuid { bytes }
    }

    /// Creates a new 128-bit UUID directly from 16 bytes (big-endian).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Returns the underlying 16 bytes in little-endian order.
    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Returns the underlying 16 bytes in big-endian order.
    pub fn as_bytes_be(&self) -> [u8; 16] {
        let mut bytes = self.bytes;
        bytes.reverse();
        bytes
    }

    /// Returns the 16-bit short form of a SIG-assigned UUID.
    pub fn as_u16(&self) -> Option<u16> {
        let sig = self.bytes[0..BASE_OFFSET] == BASE_UUID_BYTES[0..BASE_OFFSET]
            && self.bytes[BASE_OFFSET + 2] == 0
            && self.bytes[BASE_OFFSET + 3] == 0;
        sig.then(|| u16::from_le_bytes([self.bytes[BASE_OFFSET], self.bytes[BASE_OFFSET + 1]]))
    }
}

impl From<[u8; 16]> for Uuid {
    /// Assumes bytes are in little-endian order.
    fn from(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes_le(bytes)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Standard hyphenated format (big-endian)
        let b = self.as_bytes_be();
        write!(f, "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u16() {
            Some(short) => write!(f, "Uuid(0x{:04X})", short),
            None => write!(f, "Uuid({})", self),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UuidParseError {
    #[error("expected 32 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex: {0}")]
    HexError(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Parses the hyphenated (or bare) 128-bit form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();
        if cleaned.len() != 32 {
            return Err(UuidParseError::InvalidLength(cleaned.len()));
        }

        let mut bytes_be = [0u8; 16];
        hex::decode_to_slice(&cleaned, &mut bytes_be)?;
        Ok(Uuid::from_bytes_be(bytes_be))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_service_uuid_layout() {
        assert_eq!(
            CUSTOM_SERVICE_UUID.to_string(),
            "12345678-1234-5678-1234-56789abcdef0"
        );
        // Advertising data carries the least significant byte first
        assert_eq!(CUSTOM_SERVICE_UUID.as_bytes_le()[0], 0xf0);
        assert_eq!(CUSTOM_SERVICE_UUID.as_bytes_le()[15], 0x12);
        assert_eq!(CUSTOM_SERVICE_UUID.as_u16(), None);
    }

    #[test]
    fn test_parse_uuid() {
        let uuid: Uuid = "12345678-1234-5678-1234-56789ABCDEF0".parse().unwrap();
        assert_eq!(uuid, CUSTOM_SERVICE_UUID);

        let bare: Uuid = "123456781234567812345678_9abcdef0"
            .replace('_', "")
            .parse()
            .unwrap();
        assert_eq!(bare, CUSTOM_SERVICE_UUID);

        assert_eq!(
            "1234".parse::<Uuid>(),
            Err(UuidParseError::InvalidLength(4))
        );
        assert!(matches!(
            "zz345678-1234-5678-1234-56789abcdef0".parse::<Uuid>(),
            Err(UuidParseError::HexError(_))
        ));
    }

    #[test]
    fn test_sig_assigned_short_form() {
        let battery = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);
        assert_eq!(battery.as_u16(), Some(0x180f));
        assert_eq!(format!("{:?}", battery), "Uuid(0x180F)");
    }
}

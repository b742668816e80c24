//! Device address types
//!
//! Addresses are stored in HCI wire order (least significant byte first) and
//! displayed most significant byte first, the way `hciconfig` prints them.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Address types as carried in HCI parameters
pub const PUBLIC_DEVICE_ADDRESS: u8 = 0x00;
pub const RANDOM_DEVICE_ADDRESS: u8 = 0x01;
pub const PUBLIC_IDENTITY_ADDRESS: u8 = 0x02;
pub const RANDOM_IDENTITY_ADDRESS: u8 = 0x03;

/// Public address provisioned when nothing else is configured (DE:AD:00:00:BE:EF)
pub const DEFAULT_PUBLIC_ADDRESS: DeviceAddress =
    DeviceAddress::new([0xef, 0xbe, 0x00, 0x00, 0xad, 0xde]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value {
            PUBLIC_DEVICE_ADDRESS => AddressType::Public,
            RANDOM_DEVICE_ADDRESS => AddressType::Random,
            PUBLIC_IDENTITY_ADDRESS => AddressType::PublicIdentity,
            RANDOM_IDENTITY_ADDRESS => AddressType::RandomIdentity,
            _ => AddressType::Public,
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => PUBLIC_DEVICE_ADDRESS,
            AddressType::Random => RANDOM_DEVICE_ADDRESS,
            AddressType::PublicIdentity => PUBLIC_IDENTITY_ADDRESS,
            AddressType::RandomIdentity => RANDOM_IDENTITY_ADDRESS,
        }
    }
}

/// A 48-bit Bluetooth device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    bytes: [u8; 6],
}

impl DeviceAddress {
    pub const LEN: usize = 6;

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= Self::LEN {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..Self::LEN]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.bytes
    }

    /// Checks that the address can be written to a controller.
    ///
    /// All-zero (`BDADDR_ANY`) and all-ones addresses are reserved.
    pub fn validate(&self) -> Result<(), String> {
        if self.bytes == [0x00; 6] {
            Err(format!("{} is the wildcard address", self))
        } else if self.bytes == [0xff; 6] {
            Err(format!("{} is the broadcast address", self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("expected 6 colon-separated octets, got {0}")]
    InvalidLength(usize),

    #[error("invalid octet {0:?}")]
    InvalidOctet(String),
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<&str> = s.trim().split(':').collect();
        if octets.len() != Self::LEN {
            return Err(AddressParseError::InvalidLength(octets.len()));
        }

        let mut bytes = [0u8; 6];
        for (i, octet) in octets.iter().enumerate() {
            let mut byte = [0u8; 1];
            hex::decode_to_slice(octet, &mut byte)
                .map_err(|_| AddressParseError::InvalidOctet(octet.to_string()))?;
            // Text is most significant first
            bytes[Self::LEN - 1 - i] = byte[0];
        }

        Ok(Self { bytes })
    }
}

/// The identity address the host believes the controller is using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityAddress {
    pub address: DeviceAddress,
    pub address_type: AddressType,
}

impl IdentityAddress {
    pub fn public(address: DeviceAddress) -> Self {
        Self {
            address,
            address_type: AddressType::Public,
        }
    }
}

impl fmt::Display for IdentityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.address_type {
            AddressType::Public | AddressType::PublicIdentity => "public",
            AddressType::Random | AddressType::RandomIdentity => "random",
        };
        write!(f, "{} ({})", self.address, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_most_significant_first() {
        assert_eq!(DEFAULT_PUBLIC_ADDRESS.to_string(), "DE:AD:00:00:BE:EF");
    }

    #[test]
    fn test_parse_address() {
        let addr: DeviceAddress = "DE:AD:00:00:BE:EF".parse().unwrap();
        assert_eq!(addr, DEFAULT_PUBLIC_ADDRESS);
        assert_eq!(addr.bytes(), [0xef, 0xbe, 0x00, 0x00, 0xad, 0xde]);

        let lower: DeviceAddress = "de:ad:00:00:be:ef".parse().unwrap();
        assert_eq!(lower, addr);

        assert_eq!(
            "DE:AD:00:00:BE".parse::<DeviceAddress>(),
            Err(AddressParseError::InvalidLength(5))
        );
        assert!(matches!(
            "DE:AD:00:00:BE:ZZ".parse::<DeviceAddress>(),
            Err(AddressParseError::InvalidOctet(_))
        ));
        assert!(matches!(
            "DE:AD:00:00:BE:EEF".parse::<DeviceAddress>(),
            Err(AddressParseError::InvalidOctet(_))
        ));
    }

    #[test]
    fn test_reserved_addresses_are_rejected() {
        assert!(DeviceAddress::new([0x00; 6]).validate().is_err());
        assert!(DeviceAddress::new([0xff; 6]).validate().is_err());
        assert!(DEFAULT_PUBLIC_ADDRESS.validate().is_ok());
    }

    #[test]
    fn test_address_type_conversion() {
        assert_eq!(AddressType::from(0x01), AddressType::Random);
        assert_eq!(u8::from(AddressType::PublicIdentity), 0x02);
        // Unknown values fall back to public
        assert_eq!(AddressType::from(0x7f), AddressType::Public);
    }

    #[test]
    fn test_from_slice() {
        assert!(DeviceAddress::from_slice(&[1, 2, 3]).is_none());
        let addr = DeviceAddress::from_slice(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(addr.as_slice(), &[1, 2, 3, 4, 5, 6]);
    }
}

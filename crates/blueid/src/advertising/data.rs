//! Advertising and scan response payloads
//!
//! A payload is a sequence of AD structures, each encoded as
//! `length, type, data` where `length` counts the type octet and the data.
//! Legacy advertising carries at most 31 bytes per payload.

use crate::advertising::constants::*;
use crate::error::AdvertisingError;
use crate::hci::packet::ADV_DATA_LEN;
use crate::uuid::Uuid;
use bitflags::bitflags;

bitflags! {
    /// Contents of the Flags AD structure
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AdFlags: u8 {
        const LE_LIMITED_DISCOVERABLE = 0x01;
        const LE_GENERAL_DISCOVERABLE = 0x02;
        const BR_EDR_NOT_SUPPORTED = 0x04;
    }
}

impl Default for AdFlags {
    /// General discoverable, LE only
    fn default() -> Self {
        AdFlags::LE_GENERAL_DISCOVERABLE | AdFlags::BR_EDR_NOT_SUPPORTED
    }
}

/// A single AD structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdStructure {
    Flags(AdFlags),
    ServiceUuids128 { complete: bool, uuids: Vec<Uuid> },
    CompleteLocalName(String),
    ShortenedLocalName(String),
    TxPowerLevel(i8),
    ManufacturerData { company_id: u16, data: Vec<u8> },
    Raw { ad_type: u8, data: Vec<u8> },
}

impl AdStructure {
    pub fn ad_type(&self) -> u8 {
        match self {
            Self::Flags(_) => AD_TYPE_FLAGS,
            Self::ServiceUuids128 { complete: true, .. } => AD_TYPE_128BIT_SERVICE_UUID_COMPLETE,
            Self::ServiceUuids128 { complete: false, .. } => AD_TYPE_128BIT_SERVICE_UUID_PARTIAL,
            Self::CompleteLocalName(_) => AD_TYPE_COMPLETE_LOCAL_NAME,
            Self::ShortenedLocalName(_) => AD_TYPE_SHORT_LOCAL_NAME,
            Self::TxPowerLevel(_) => AD_TYPE_TX_POWER_LEVEL,
            Self::ManufacturerData { .. } => AD_TYPE_MANUFACTURER_SPECIFIC,
            Self::Raw { ad_type, .. } => *ad_type,
        }
    }

    fn data_len(&self) -> usize {
        match self {
            Self::Flags(_) | Self::TxPowerLevel(_) => 1,
            Self::ServiceUuids128 { uuids, .. } => uuids.len() * 16,
            Self::CompleteLocalName(name) | Self::ShortenedLocalName(name) => name.len(),
            Self::ManufacturerData { data, .. } => 2 + data.len(),
            Self::Raw { data, .. } => data.len(),
        }
    }

    /// Encoded size including the length and type octets
    pub fn encoded_len(&self) -> usize {
        AD_HEADER_LEN + self.data_len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push((1 + self.data_len()) as u8);
        out.push(self.ad_type());

        match self {
            Self::Flags(flags) => out.push(flags.bits()),
            Self::ServiceUuids128 { uuids, .. } => {
                for uuid in uuids {
                    out.extend_from_slice(uuid.as_bytes_le());
                }
            }
            Self::CompleteLocalName(name) | Self::ShortenedLocalName(name) => {
                out.extend_from_slice(name.as_bytes())
            }
            Self::TxPowerLevel(level) => out.push(*level as u8),
            Self::ManufacturerData { company_id, data } => {
                out.extend_from_slice(&company_id.to_le_bytes());
                out.extend_from_slice(data);
            }
            Self::Raw { data, .. } => out.extend_from_slice(data),
        }
    }
}

/// An ordered set of AD structures forming one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisingData {
    structures: Vec<AdStructure>,
}

impl AdvertisingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, structure: AdStructure) -> Self {
        self.structures.push(structure);
        self
    }

    /// Appends the device name, shortening it if the whole name does not fit.
    ///
    /// Should be added last. The name is left out entirely when not even one
    /// character fits.
    pub fn with_name(self, name: &str) -> Self {
        if name.is_empty() {
            return self;
        }

        let room = ADV_DATA_LEN.saturating_sub(self.encoded_len() + AD_HEADER_LEN);
        if name.len() <= room {
            return self.push(AdStructure::CompleteLocalName(name.to_string()));
        }

        let mut end = room;
        while end > 0 && !name.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            return self;
        }
        self.push(AdStructure::ShortenedLocalName(name[..end].to_string()))
    }

    pub fn structures(&self) -> &[AdStructure] {
        &self.structures
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        self.structures.iter().map(AdStructure::encoded_len).sum()
    }

    /// Encodes the payload, refusing anything over 31 bytes
    pub fn encode(&self) -> Result<Vec<u8>, AdvertisingError> {
        let len = self.encoded_len();
        if len > ADV_DATA_LEN {
            return Err(AdvertisingError::ConfigurationError(format!(
                "payload of {} bytes exceeds the {} byte limit",
                len, ADV_DATA_LEN
            )));
        }

        let mut out = Vec::with_capacity(len);
        for structure in &self.structures {
            structure.write_to(&mut out);
        }
        Ok(out)
    }
}

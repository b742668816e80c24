//! Advertising configuration
//!
//! `AdvertisingConfig` is built once, from the "connectable, named" template
//! plus any overrides, and is immutable afterwards.

use crate::address::AddressType;
use crate::advertising::constants::*;
use crate::advertising::data::{AdFlags, AdStructure, AdvertisingData};
use crate::error::AdvertisingError;
use crate::hci::packet::HciCommand;
use crate::uuid::{Uuid, CUSTOM_SERVICE_UUID};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertisingType {
    /// ADV_IND
    #[default]
    ConnectableUndirected,
    /// ADV_SCAN_IND
    ScannableUndirected,
    /// ADV_NONCONN_IND
    NonConnectableUndirected,
}

impl From<AdvertisingType> for u8 {
    fn from(value: AdvertisingType) -> Self {
        match value {
            AdvertisingType::ConnectableUndirected => ADV_IND,
            AdvertisingType::ScannableUndirected => ADV_SCAN_IND,
            AdvertisingType::NonConnectableUndirected => ADV_NONCONN_IND,
        }
    }
}

/// Values for LE Set Advertising Parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParameters {
    pub min_interval: u16,
    pub max_interval: u16,
    pub advertising_type: AdvertisingType,
    pub own_address_type: AddressType,
    pub channel_map: u8,
    pub filter_policy: u8,
}

impl Default for AdvertisingParameters {
    fn default() -> Self {
        Self {
            min_interval: ADV_INTERVAL_MIN_DEFAULT,
            max_interval: ADV_INTERVAL_MAX_DEFAULT,
            advertising_type: AdvertisingType::ConnectableUndirected,
            own_address_type: AddressType::Public,
            channel_map: ADV_CHANNEL_MAP_ALL,
            filter_policy: ADV_FILTER_POLICY_NONE,
        }
    }
}

impl AdvertisingParameters {
    pub fn validate(&self) -> Result<(), AdvertisingError> {
        if self.min_interval < ADV_INTERVAL_LOWER_BOUND
            || self.max_interval > ADV_INTERVAL_UPPER_BOUND
            || self.min_interval > self.max_interval
        {
            return Err(AdvertisingError::ConfigurationError(format!(
                "advertising interval 0x{:04x}..0x{:04x} outside 0x{:04x}..0x{:04x}",
                self.min_interval,
                self.max_interval,
                ADV_INTERVAL_LOWER_BOUND,
                ADV_INTERVAL_UPPER_BOUND
            )));
        }

        if self.channel_map & ADV_CHANNEL_MAP_ALL == 0 || self.channel_map & !ADV_CHANNEL_MAP_ALL != 0 {
            return Err(AdvertisingError::ConfigurationError(format!(
                "invalid channel map 0x{:02x}",
                self.channel_map
            )));
        }

        Ok(())
    }

    pub fn is_connectable(&self) -> bool {
        self.advertising_type == AdvertisingType::ConnectableUndirected
    }

    pub fn to_command(&self) -> HciCommand {
        HciCommand::LeSetAdvertisingParameters {
            min_interval: self.min_interval,
            max_interval: self.max_interval,
            advertising_type: self.advertising_type.into(),
            own_address_type: self.own_address_type.into(),
            // Only used for directed advertising
            peer_address_type: 0,
            peer_address: [0; 6],
            channel_map: self.channel_map,
            filter_policy: self.filter_policy,
        }
    }
}

/// Converts a duration to advertising interval units, rounding down
pub fn interval_from_duration(duration: Duration) -> u16 {
    let units = duration.as_micros() / ADV_INTERVAL_UNIT_US as u128;
    units.min(u16::MAX as u128) as u16
}

/// Converts advertising interval units to a duration
pub fn interval_to_duration(units: u16) -> Duration {
    Duration::from_micros(units as u64 * ADV_INTERVAL_UNIT_US as u64)
}

/// Complete advertising setup: parameters and both payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingConfig {
    name: String,
    parameters: AdvertisingParameters,
    flags: AdFlags,
    service_uuids: Vec<Uuid>,
    advertising_data: AdvertisingData,
    scan_response_data: AdvertisingData,
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self::connectable_named(DEFAULT_DEVICE_NAME)
    }
}

impl AdvertisingConfig {
    /// The default template: connectable, general discoverable, with the
    /// custom service and the device name in the scan response. Long names
    /// are shortened to fit.
    pub fn connectable_named(name: &str) -> Self {
        let flags = AdFlags::default();
        let service_uuids = vec![CUSTOM_SERVICE_UUID];
        Self {
            name: name.to_string(),
            parameters: AdvertisingParameters::default(),
            flags,
            advertising_data: advertising_payload(flags),
            scan_response_data: scan_response_payload(&service_uuids, name),
            service_uuids,
        }
    }

    pub fn builder() -> AdvertisingConfigBuilder {
        AdvertisingConfigBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &AdvertisingParameters {
        &self.parameters
    }

    pub fn flags(&self) -> AdFlags {
        self.flags
    }

    pub fn service_uuids(&self) -> &[Uuid] {
        &self.service_uuids
    }

    pub fn advertising_data(&self) -> &AdvertisingData {
        &self.advertising_data
    }

    pub fn scan_response_data(&self) -> &AdvertisingData {
        &self.scan_response_data
    }

    pub fn is_connectable(&self) -> bool {
        self.parameters.is_connectable()
    }

    /// Checks the interval bounds and that both payloads fit
    pub fn validate(&self) -> Result<(), AdvertisingError> {
        self.parameters.validate()?;
        self.advertising_data.encode()?;
        self.scan_response_data.encode()?;
        Ok(())
    }
}

fn advertising_payload(flags: AdFlags) -> AdvertisingData {
    AdvertisingData::new().push(AdStructure::Flags(flags))
}

fn scan_response_payload(service_uuids: &[Uuid], name: &str) -> AdvertisingData {
    let mut data = AdvertisingData::new();
    if !service_uuids.is_empty() {
        data = data.push(AdStructure::ServiceUuids128 {
            complete: true,
            uuids: service_uuids.to_vec(),
        });
    }
    data.with_name(name)
}

/// Overrides applied on top of the default template
#[derive(Debug, Clone, Default)]
pub struct AdvertisingConfigBuilder {
    name: Option<String>,
    interval: Option<(u16, u16)>,
    connectable: Option<bool>,
    flags: Option<AdFlags>,
    service_uuids: Option<Vec<Uuid>>,
    own_address_type: Option<AddressType>,
    channel_map: Option<u8>,
    extra_advertising_data: Vec<AdStructure>,
}

impl AdvertisingConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Interval bounds in units of 0.625 ms
    pub fn interval(mut self, min: u16, max: u16) -> Self {
        self.interval = Some((min, max));
        self
    }

    pub fn interval_duration(self, min: Duration, max: Duration) -> Self {
        self.interval(interval_from_duration(min), interval_from_duration(max))
    }

    pub fn connectable(mut self, connectable: bool) -> Self {
        self.connectable = Some(connectable);
        self
    }

    pub fn flags(mut self, flags: AdFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Replaces the advertised 128-bit service list
    pub fn service_uuids(mut self, uuids: Vec<Uuid>) -> Self {
        self.service_uuids = Some(uuids);
        self
    }

    pub fn own_address_type(mut self, address_type: AddressType) -> Self {
        self.own_address_type = Some(address_type);
        self
    }

    pub fn channel_map(mut self, channel_map: u8) -> Self {
        self.channel_map = Some(channel_map);
        self
    }

    /// Adds a structure to the advertising payload after the flags
    pub fn advertising_structure(mut self, structure: AdStructure) -> Self {
        self.extra_advertising_data.push(structure);
        self
    }

    pub fn build(self) -> Result<AdvertisingConfig, AdvertisingError> {
        let mut config = AdvertisingConfig::connectable_named(
            self.name.as_deref().unwrap_or(DEFAULT_DEVICE_NAME),
        );

        if let Some((min, max)) = self.interval {
            config.parameters.min_interval = min;
            config.parameters.max_interval = max;
        }
        if let Some(connectable) = self.connectable {
            config.parameters.advertising_type = if connectable {
                AdvertisingType::ConnectableUndirected
            } else {
                AdvertisingType::ScannableUndirected
            };
        }
        if let Some(address_type) = self.own_address_type {
            config.parameters.own_address_type = address_type;
        }
        if let Some(channel_map) = self.channel_map {
            config.parameters.channel_map = channel_map;
        }

        if let Some(flags) = self.flags {
            if flags.contains(AdFlags::LE_LIMITED_DISCOVERABLE | AdFlags::LE_GENERAL_DISCOVERABLE) {
                return Err(AdvertisingError::ConfigurationError(
                    "limited and general discoverable are exclusive".to_string(),
                ));
            }
            config.flags = flags;
        }
        if let Some(uuids) = self.service_uuids {
            config.service_uuids = uuids;
        }

        let mut advertising_data = advertising_payload(config.flags);
        for structure in self.extra_advertising_data {
            advertising_data = advertising_data.push(structure);
        }
        config.advertising_data = advertising_data;
        config.scan_response_data = scan_response_payload(&config.service_uuids, &config.name);

        config.validate()?;
        Ok(config)
    }
}

//! Daemon configuration file
//!
//! Every field has a default, so an empty JSON object is a valid file.

use anyhow::{Context, Result};
use blueid::address::DEFAULT_PUBLIC_ADDRESS;
use blueid::advertising::constants::DEFAULT_DEVICE_NAME;
use blueid::{AdvertisingConfig, AdvertisingPolicy, DeviceAddress, HciChannel, Uuid, CUSTOM_SERVICE_UUID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSetting {
    #[default]
    Raw,
    User,
}

impl From<ChannelSetting> for HciChannel {
    fn from(value: ChannelSetting) -> Self {
        match value {
            ChannelSetting::Raw => HciChannel::Raw,
            ChannelSetting::User => HciChannel::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySetting {
    #[default]
    RequireProvisionedAddress,
    Unconditional,
}

impl From<PolicySetting> for AdvertisingPolicy {
    fn from(value: PolicySetting) -> Self {
        match value {
            PolicySetting::RequireProvisionedAddress => AdvertisingPolicy::RequireProvisionedAddress,
            PolicySetting::Unconditional => AdvertisingPolicy::Unconditional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertisingSettings {
    pub name: String,
    pub interval_min_ms: u64,
    pub interval_max_ms: u64,
    pub connectable: bool,
    pub service_uuid: String,
}

impl Default for AdvertisingSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
            interval_min_ms: 100,
            interval_max_ms: 150,
            connectable: true,
            service_uuid: CUSTOM_SERVICE_UUID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String, // "trace", "debug", "info", "warn", "error" or an EnvFilter directive
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub ansi_colors: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            ansi_colors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub hci_device: u16,
    pub channel: ChannelSetting,
    pub public_address: String,
    pub policy: PolicySetting,
    pub command_timeout_ms: u64,
    pub advertising: AdvertisingSettings,
    pub log: LogSettings,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            hci_device: 0,
            channel: ChannelSetting::default(),
            public_address: DEFAULT_PUBLIC_ADDRESS.to_string(),
            policy: PolicySetting::default(),
            command_timeout_ms: 10_000,
            advertising: AdvertisingSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn address(&self) -> Result<DeviceAddress> {
        self.public_address
            .parse()
            .with_context(|| format!("invalid public address {:?}", self.public_address))
    }

    pub fn policy(&self) -> AdvertisingPolicy {
        self.policy.into()
    }

    pub fn hci_channel(&self) -> HciChannel {
        self.channel.into()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn advertising_config(&self) -> Result<AdvertisingConfig> {
        let settings = &self.advertising;
        let uuid: Uuid = settings
            .service_uuid
            .parse()
            .with_context(|| format!("invalid service UUID {:?}", settings.service_uuid))?;

        let config = AdvertisingConfig::builder()
            .name(settings.name.as_str())
            .interval_duration(
                Duration::from_millis(settings.interval_min_ms),
                Duration::from_millis(settings.interval_max_ms),
            )
            .connectable(settings.connectable)
            .service_uuids(vec![uuid])
            .build()
            .context("invalid advertising settings")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DaemonConfig::from_json("{}").unwrap();

        assert_eq!(config.hci_device, 0);
        assert_eq!(config.hci_channel(), HciChannel::Raw);
        assert_eq!(config.address().unwrap(), DEFAULT_PUBLIC_ADDRESS);
        assert_eq!(config.policy(), AdvertisingPolicy::RequireProvisionedAddress);
        assert_eq!(config.command_timeout(), Duration::from_secs(10));
        assert_eq!(config.log.level, "info");

        // Defaults reproduce the library's template exactly
        assert_eq!(config.advertising_config().unwrap(), AdvertisingConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = DaemonConfig::from_json(
            r#"{
                "hci_device": 1,
                "channel": "user",
                "public_address": "C0:FF:EE:00:00:01",
                "policy": "unconditional",
                "advertising": { "name": "sensor", "interval_min_ms": 50, "connectable": false },
                "log": { "level": "blueid=debug" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.hci_device, 1);
        assert_eq!(config.hci_channel(), HciChannel::User);
        assert_eq!(
            config.address().unwrap().bytes(),
            [0x01, 0x00, 0x00, 0xee, 0xff, 0xc0]
        );
        assert_eq!(config.policy(), AdvertisingPolicy::Unconditional);

        let advertising = config.advertising_config().unwrap();
        assert_eq!(advertising.name(), "sensor");
        assert_eq!(advertising.parameters().min_interval, 80);
        assert_eq!(advertising.parameters().max_interval, 0x00F0);
        assert!(!advertising.is_connectable());
        assert_eq!(config.log.level, "blueid=debug");
        assert!(config.log.show_target);
    }

    #[test]
    fn test_invalid_values() {
        let config = DaemonConfig::from_json(r#"{ "public_address": "DE:AD:BE:EF" }"#).unwrap();
        assert!(config.address().is_err());

        let config =
            DaemonConfig::from_json(r#"{ "advertising": { "interval_min_ms": 5 } }"#).unwrap();
        assert!(config.advertising_config().is_err());

        let config =
            DaemonConfig::from_json(r#"{ "advertising": { "service_uuid": "1234" } }"#).unwrap();
        assert!(config.advertising_config().is_err());

        assert!(DaemonConfig::from_json(r#"{ "policy": "sometimes" }"#).is_err());
        assert!(DaemonConfig::from_json(r#"{ "hci_device": "hci0" }"#).is_err());
    }
}

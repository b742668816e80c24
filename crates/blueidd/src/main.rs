//! blueidd - brings up a BLE peripheral with a fixed public address and
//! keeps servicing its connection events

mod config;
mod logging;

use anyhow::{Context, Result};
use blueid::{CommandChannel, HciSocket, Peripheral};
use clap::Parser;
use config::{DaemonConfig, PolicySetting};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "blueidd", version, about = "BLE peripheral bring-up daemon")]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HCI device index (hciN)
    #[arg(short, long)]
    device: Option<u16>,

    /// Public address to provision, e.g. DE:AD:00:00:BE:EF
    #[arg(short, long)]
    address: Option<String>,

    /// Log level or filter directive
    #[arg(long)]
    log_level: Option<String>,

    /// Advertise even if the address write fails
    #[arg(long)]
    unconditional: bool,
}

impl Args {
    fn apply(&self, config: &mut DaemonConfig) {
        if let Some(device) = self.device {
            config.hci_device = device;
        }
        if let Some(address) = &self.address {
            config.public_address = address.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.unconditional {
            config.policy = PolicySetting::Unconditional;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    args.apply(&mut config);

    logging::init_logger(&config.log)?;

    if let Err(e) = run(&config) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(config: &DaemonConfig) -> Result<()> {
    let address = config.address()?;
    let advertising = config.advertising_config()?;

    let socket = HciSocket::open_channel(config.hci_device, config.hci_channel())
        .with_context(|| format!("opening hci{}", config.hci_device))?;
    let channel = CommandChannel::new(socket).with_command_timeout(config.command_timeout());
    let mut device = Peripheral::new(channel, config.policy());

    device
        .bring_up(address, advertising)
        .context("bring-up aborted")?;
    info!(state = %device.state(), "servicing connection events");

    loop {
        device
            .process_events(None)
            .context("reading controller events")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "blueidd",
            "--device",
            "2",
            "--address",
            "11:22:33:44:55:66",
            "--log-level",
            "trace",
            "--unconditional",
        ]);
        let mut config = DaemonConfig::default();
        args.apply(&mut config);

        assert_eq!(config.hci_device, 2);
        assert_eq!(config.address().unwrap().to_string(), "11:22:33:44:55:66");
        assert_eq!(config.log.level, "trace");
        assert_eq!(config.policy, PolicySetting::Unconditional);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["blueidd"]);
        let mut config = DaemonConfig::default();
        args.apply(&mut config);

        assert_eq!(config.hci_device, 0);
        assert_eq!(config.public_address, "DE:AD:00:00:BE:EF");
        assert_eq!(config.policy, PolicySetting::RequireProvisionedAddress);
    }
}

//! blueid - bring up a Bluetooth LE peripheral with a provisioned public address
//!
//! The library drives a controller over HCI: it powers the controller up,
//! writes a fixed public identity address with the vendor specific Write
//! BD_ADDR command, then starts connectable advertising. Commands are
//! issued one at a time through a `CommandChannel`, which correlates each
//! Command Complete with its command and routes connection events to
//! subscribers.
//!
//! ```no_run
//! use blueid::{AdvertisingConfig, AdvertisingPolicy, CommandChannel, HciSocket, Peripheral};
//! use blueid::address::DEFAULT_PUBLIC_ADDRESS;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = CommandChannel::new(HciSocket::open(0)?);
//! let mut device = Peripheral::new(channel, AdvertisingPolicy::default());
//! device.bring_up(DEFAULT_PUBLIC_ADDRESS, AdvertisingConfig::default())?;
//! device.process_events(None)?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod advertising;
pub mod bringup;
pub mod connection;
pub mod error;
pub mod hci;
pub mod uuid;

#[cfg(test)]
pub(crate) mod mock;

// Re-export common types for convenience
pub use address::{AddressType, DeviceAddress, IdentityAddress};
pub use advertising::{AdFlags, AdStructure, AdvertisingConfig, AdvertisingData};
pub use bringup::{
    AddressProvisioner, AdvertisingManager, AdvertisingPolicy, BringupContext, BringupState,
    ControllerSession, Peripheral,
};
pub use connection::{
    ConnectionEvent, ConnectionEventSink, ConnectionState, ConnectionTracker, Peer,
};
pub use error::{AdvertisingError, BringupError, ControllerError, HciError, ProvisioningError};
pub use hci::{CommandChannel, HciChannel, HciCommand, HciEvent, HciSocket, HciTransport};
pub use uuid::{Uuid, CUSTOM_SERVICE_UUID};

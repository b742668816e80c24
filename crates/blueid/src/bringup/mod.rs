//! Peripheral bring-up
//!
//! `Idle → ControllerEnabled → AddressSet → Advertising`, with `Connected`
//! while a peer is attached. Any fatal error moves to the terminal `Aborted`
//! state. Each stage is its own component borrowing the command channel;
//! `Peripheral` runs them in order.

pub mod advertising;
pub mod context;
pub mod controller;
pub mod peripheral;
pub mod provisioner;


pub use advertising::AdvertisingManager;
pub use context::{AdvertisingPolicy, BringupContext, BringupState};
pub use controller::ControllerSession;
pub use peripheral::Peripheral;
pub use provisioner::AddressProvisioner;

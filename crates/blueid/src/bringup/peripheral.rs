//! Runs the whole bring-up sequence against one controller

use crate::address::DeviceAddress;
use crate::advertising::AdvertisingConfig;
use crate::bringup::advertising::AdvertisingManager;
use crate::bringup::context::{AdvertisingPolicy, BringupContext, BringupState};
use crate::bringup::controller::ControllerSession;
use crate::bringup::provisioner::AddressProvisioner;
use crate::connection::{ConnectionEvent, ConnectionEventSink};
use crate::error::{AdvertisingError, BringupError, ControllerError, HciError, ProvisioningError};
use crate::hci::constants::HCI_SUCCESS;
use crate::hci::{CommandChannel, HciCommand, HciTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A peripheral being brought up: the command channel plus its context.
///
/// The context's `ConnectionTracker` is subscribed on construction, so
/// `state()` reports `Connected` as soon as a peer connects.
///
/// A controller stops connectable advertising when a link is established.
/// `process_events` turns it back on after every disconnection, and after a
/// connection attempt that failed, so the device stays discoverable across
/// connect and disconnect cycles.
#[derive(Debug)]
pub struct Peripheral<T> {
    channel: CommandChannel<T>,
    context: BringupContext,
}

impl<T: HciTransport> Peripheral<T> {
    pub fn new(channel: CommandChannel<T>, policy: AdvertisingPolicy) -> Self {
        let context = BringupContext::new(policy);
        channel.subscribe(context.connections().clone());
        Self { channel, context }
    }

    pub fn channel(&self) -> &CommandChannel<T> {
        &self.channel
    }

    pub fn context(&self) -> &BringupContext {
        &self.context
    }

    pub fn state(&self) -> BringupState {
        self.context.state()
    }

    /// Registers another connection event subscriber
    pub fn subscribe(&self, sink: Arc<dyn ConnectionEventSink>) {
        self.channel.subscribe(sink);
    }

    pub fn enable(&mut self) -> Result<(), ControllerError> {
        ControllerSession::new(&self.channel).enable(&mut self.context)
    }

    pub fn set_public_address(&mut self, address: DeviceAddress) -> Result<(), ProvisioningError> {
        AddressProvisioner::new(&self.channel).set_public_address(&mut self.context, address)
    }

    pub fn start_advertising(&mut self, config: AdvertisingConfig) -> Result<(), AdvertisingError> {
        AdvertisingManager::new(&self.channel).start_advertising(&mut self.context, config)
    }

    /// Enables the controller, writes `address` and starts advertising.
    ///
    /// Stops at the first fatal error and leaves the state `Aborted`. Under
    /// the `Unconditional` policy a failed address write is not fatal.
    pub fn bring_up(
        &mut self,
        address: DeviceAddress,
        config: AdvertisingConfig,
    ) -> Result<(), BringupError> {
        let result = self.run_sequence(address, config);
        if result.is_err() && !self.context.is_aborted() {
            self.context.abort();
        }
        result
    }

    fn run_sequence(
        &mut self,
        address: DeviceAddress,
        config: AdvertisingConfig,
    ) -> Result<(), BringupError> {
        self.enable()?;

        if let Err(e) = self.set_public_address(address) {
            if self.context.policy() == AdvertisingPolicy::RequireProvisionedAddress {
                return Err(e.into());
            }
        }

        self.start_advertising(config)?;

        if let Some(identity) = self.context.identity() {
            info!(%identity, "peripheral is up");
        }
        Ok(())
    }

    /// Services connection events for up to `timeout` (forever with `None`)
    pub fn process_events(&self, timeout: Option<Duration>) -> Result<usize, HciError> {
        let resume = self
            .context
            .active_advertising()
            .is_some_and(|config| config.is_connectable());

        self.channel.process_events_with(timeout, |event| {
            if !resume || !ends_advertising(event) {
                return None;
            }
            info!("Resuming advertising");
            Some(HciCommand::LeSetAdvertisingEnable { enable: true })
        })
    }
}

fn ends_advertising(event: &ConnectionEvent) -> bool {
    match event {
        ConnectionEvent::Disconnected { .. } => true,
        ConnectionEvent::Connected { status, .. } => *status != HCI_SUCCESS,
    }
}

//! Controller power-up

use crate::address::{DeviceAddress, IdentityAddress};
use crate::bringup::context::{BringupContext, BringupState};
use crate::error::{ControllerError, HciError};
use crate::hci::constants::{DEFAULT_EVENT_MASK, DEFAULT_LE_EVENT_MASK};
use crate::hci::{CommandChannel, CommandComplete, HciCommand, HciTransport};
use tracing::{info, warn};

/// Brings the controller out of reset so it accepts commands
pub struct ControllerSession<'a, T> {
    channel: &'a CommandChannel<T>,
}

impl<'a, T: HciTransport> ControllerSession<'a, T> {
    pub fn new(channel: &'a CommandChannel<T>) -> Self {
        Self { channel }
    }

    /// Resets the controller, enables the events bring-up relies on and
    /// reads the factory address.
    ///
    /// Only valid from `Idle`. Any failure aborts bring-up; nothing is
    /// retried.
    pub fn enable(&self, ctx: &mut BringupContext) -> Result<(), ControllerError> {
        let state = ctx.state();
        if state != BringupState::Idle {
            return Err(ControllerError::InvalidState(state));
        }

        match self.initialize() {
            Ok(factory) => {
                ctx.set_identity(IdentityAddress::public(factory));
                ctx.set_state(BringupState::ControllerEnabled);
                info!(address = %factory, "Bluetooth initialized");
                Ok(())
            }
            Err(e) => {
                warn!("Bluetooth init failed: {}", e);
                ctx.abort();
                Err(e)
            }
        }
    }

    fn initialize(&self) -> Result<DeviceAddress, ControllerError> {
        self.run(&HciCommand::Reset)?;
        self.run(&HciCommand::SetEventMask {
            event_mask: DEFAULT_EVENT_MASK,
        })?;
        self.run(&HciCommand::LeSetEventMask {
            event_mask: DEFAULT_LE_EVENT_MASK,
        })?;

        let complete = self.run(&HciCommand::ReadBdAddr)?;
        // Status byte, then the address
        let address = complete
            .return_parameters
            .get(1..)
            .and_then(DeviceAddress::from_slice)
            .ok_or(HciError::InvalidPacketFormat)?;
        Ok(address)
    }

    fn run(&self, command: &HciCommand) -> Result<CommandComplete, ControllerError> {
        let complete = self.channel.issue(command)?;
        if !complete.is_success() {
            return Err(ControllerError::InitFailed(complete.status));
        }
        Ok(complete)
    }
}

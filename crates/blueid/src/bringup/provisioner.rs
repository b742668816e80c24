//! Public address provisioning
//!
//! The address is written with the vendor specific Write BD_ADDR command
//! (OGF 0x3F, OCF 0x0006). Controllers apply it immediately; it does not
//! survive a power cycle.

use crate::address::{DeviceAddress, IdentityAddress};
use crate::bringup::context::{AdvertisingPolicy, BringupContext, BringupState};
use crate::error::ProvisioningError;
use crate::hci::{CommandChannel, HciCommand, HciTransport};
use tracing::{info, warn};

pub struct AddressProvisioner<'a, T> {
    channel: &'a CommandChannel<T>,
}

impl<'a, T: HciTransport> AddressProvisioner<'a, T> {
    pub fn new(channel: &'a CommandChannel<T>) -> Self {
        Self { channel }
    }

    /// Writes `address` to the controller and waits for its completion.
    ///
    /// On success the cached identity becomes `address`. On failure the
    /// identity is left as it was and, unless the policy is
    /// `Unconditional`, bring-up is aborted.
    pub fn set_public_address(
        &self,
        ctx: &mut BringupContext,
        address: DeviceAddress,
    ) -> Result<(), ProvisioningError> {
        let state = ctx.state();
        if state != BringupState::ControllerEnabled {
            return Err(ProvisioningError::InvalidState(state));
        }
        address
            .validate()
            .map_err(ProvisioningError::ConfigurationError)?;

        match self.write(address) {
            Ok(()) => {
                ctx.set_identity(IdentityAddress::public(address));
                ctx.set_state(BringupState::AddressSet);
                info!("Set public address to {}", address);
                Ok(())
            }
            Err(e) => {
                warn!("Write BD_ADDR not executed properly: {}", e);
                match ctx.policy() {
                    AdvertisingPolicy::RequireProvisionedAddress => ctx.abort(),
                    AdvertisingPolicy::Unconditional => {
                        if let Some(identity) = ctx.identity() {
                            warn!(%identity, "continuing with the controller's address");
                        }
                    }
                }
                Err(e)
            }
        }
    }

    fn write(&self, address: DeviceAddress) -> Result<(), ProvisioningError> {
        let request = HciCommand::VsWriteBdAddr { address };
        let mut command = self
            .channel
            .create_command(request.opcode(), DeviceAddress::LEN)?;
        command.add(&request.parameters())?;

        // The command buffer is released inside send_sync on every path
        let response = self.channel.send_sync(command)?;
        if !response.is_success() {
            return Err(ProvisioningError::ProtocolError(response.status));
        }
        Ok(())
    }
}

//! Starting connectable advertising

use crate::advertising::{AdvertisingConfig, AdvertisingData, AdvertisingParameters};
use crate::bringup::context::{AdvertisingPolicy, BringupContext, BringupState};
use crate::error::AdvertisingError;
use crate::hci::{CommandChannel, HciCommand, HciTransport};
use tracing::{debug, info, warn};

pub struct AdvertisingManager<'a, T> {
    channel: &'a CommandChannel<T>,
}

impl<'a, T: HciTransport> AdvertisingManager<'a, T> {
    pub fn new(channel: &'a CommandChannel<T>) -> Self {
        Self { channel }
    }

    /// Configures and enables advertising with `config`.
    ///
    /// Refused with `InvalidState` before the address is set, unless the
    /// policy is `Unconditional`. A failure leaves the device not
    /// advertising and aborts bring-up.
    pub fn start_advertising(
        &self,
        ctx: &mut BringupContext,
        config: AdvertisingConfig,
    ) -> Result<(), AdvertisingError> {
        let state = ctx.state();
        let allowed = match state {
            BringupState::AddressSet => true,
            BringupState::ControllerEnabled => ctx.policy() == AdvertisingPolicy::Unconditional,
            _ => false,
        };
        if !allowed {
            return Err(AdvertisingError::InvalidState(state));
        }

        if let Some(identity) = ctx.identity() {
            debug!(%identity, name = config.name(), "starting advertising");
        }

        match self.advertise(
            config.parameters(),
            config.advertising_data(),
            config.scan_response_data(),
        ) {
            Ok(()) => {
                ctx.set_advertising(config);
                ctx.set_state(BringupState::Advertising);
                info!("Advertising successfully started");
                Ok(())
            }
            Err(e) => {
                warn!("Advertising failed to start: {}", e);
                ctx.abort();
                Err(e)
            }
        }
    }

    /// Issues the parameter, payload and enable commands in order
    pub fn advertise(
        &self,
        params: &AdvertisingParameters,
        advertising_data: &AdvertisingData,
        scan_response_data: &AdvertisingData,
    ) -> Result<(), AdvertisingError> {
        params.validate()?;
        let advertising_data = advertising_data.encode()?;
        let scan_response_data = scan_response_data.encode()?;

        self.run(&params.to_command())?;
        self.run(&HciCommand::LeSetAdvertisingData {
            data: advertising_data,
        })?;
        self.run(&HciCommand::LeSetScanResponseData {
            data: scan_response_data,
        })?;
        self.run(&HciCommand::LeSetAdvertisingEnable { enable: true })
    }

    fn run(&self, command: &HciCommand) -> Result<(), AdvertisingError> {
        let complete = self.channel.issue(command)?;
        if !complete.is_success() {
            return Err(AdvertisingError::ProtocolError {
                opcode: complete.opcode,
                status: complete.status,
            });
        }
        Ok(())
    }
}

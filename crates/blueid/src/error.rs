//! Error types for the blueid library
//!
//! `HciError` covers the command channel and the transport underneath it.
//! Each bring-up component has its own error enum so callers can tell which
//! stage failed; `BringupError` wraps all three for the orchestrator.

use crate::bringup::BringupState;
use thiserror::Error;

/// Errors that can occur on the HCI command channel or transport
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Failed to open HCI socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to HCI device: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send HCI command: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive HCI event: {0}")]
    ReceiveError(std::io::Error),

    #[error("Invalid parameter length: {0}")]
    InvalidParamLength(usize),

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,

    #[error("Timed out waiting for completion of opcode 0x{0:04x}")]
    Timeout(u16),

    #[error("No command buffer available")]
    NoBuffers,

    #[error("Another command is already outstanding")]
    CommandPending,
}

impl HciError {
    /// Returns true if this error is a read timeout rather than a failure
    pub fn is_timeout(&self) -> bool {
        match self {
            HciError::Timeout(_) => true,
            HciError::ReceiveError(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// Errors from powering up the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Controller initialization failed (status 0x{0:02x})")]
    InitFailed(u8),

    #[error("Transport error: {0}")]
    TransportError(#[from] HciError),

    #[error("Controller cannot be enabled in state {0:?}")]
    InvalidState(BringupState),
}

/// Errors from writing the public address to the controller
#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("Unable to allocate command buffer")]
    AllocationError,

    #[error("Transport error: {0}")]
    TransportError(HciError),

    #[error("Write address command failed (status 0x{0:02x})")]
    ProtocolError(u8),

    #[error("Invalid address: {0}")]
    ConfigurationError(String),

    #[error("Address cannot be provisioned in state {0:?}")]
    InvalidState(BringupState),
}

impl From<HciError> for ProvisioningError {
    fn from(err: HciError) -> Self {
        match err {
            HciError::NoBuffers => ProvisioningError::AllocationError,
            other => ProvisioningError::TransportError(other),
        }
    }
}

/// Errors from configuring or starting advertising
#[derive(Error, Debug)]
pub enum AdvertisingError {
    #[error("Unable to allocate command buffer")]
    AllocationError,

    #[error("Transport error: {0}")]
    TransportError(HciError),

    #[error("Advertising command 0x{opcode:04x} failed (status 0x{status:02x})")]
    ProtocolError { opcode: u16, status: u8 },

    #[error("Invalid advertising configuration: {0}")]
    ConfigurationError(String),

    #[error("Advertising cannot start in state {0:?}")]
    InvalidState(BringupState),
}

impl From<HciError> for AdvertisingError {
    fn from(err: HciError) -> Self {
        match err {
            HciError::NoBuffers => AdvertisingError::AllocationError,
            other => AdvertisingError::TransportError(other),
        }
    }
}

/// Any error that stops the bring-up sequence
#[derive(Error, Debug)]
pub enum BringupError {
    #[error("Bluetooth init failed: {0}")]
    Controller(#[from] ControllerError),

    #[error("Public address not set: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("Advertising failed to start: {0}")]
    Advertising(#[from] AdvertisingError),
}

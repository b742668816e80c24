//! Bring-up state shared by the components
//!
//! The context is owned by the caller and passed by reference into each
//! component; nothing here is global.

use crate::address::IdentityAddress;
use crate::advertising::AdvertisingConfig;
use crate::connection::{ConnectionState, ConnectionTracker};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupState {
    Idle,
    ControllerEnabled,
    AddressSet,
    Advertising,
    /// Advertising was started and a peer is connected
    Connected,
    /// An unrecoverable error occurred; only a restart leaves this state
    Aborted,
}

impl fmt::Display for BringupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BringupState::Idle => "idle",
            BringupState::ControllerEnabled => "controller enabled",
            BringupState::AddressSet => "address set",
            BringupState::Advertising => "advertising",
            BringupState::Connected => "connected",
            BringupState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Whether advertising may start without an acknowledged address write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvertisingPolicy {
    /// Advertising is refused unless the controller acknowledged the address
    #[default]
    RequireProvisionedAddress,
    /// A failed address write is logged and advertising proceeds with
    /// whatever address the controller already has
    Unconditional,
}

#[derive(Debug)]
pub struct BringupContext {
    state: BringupState,
    policy: AdvertisingPolicy,
    identity: Option<IdentityAddress>,
    advertising: Option<AdvertisingConfig>,
    connections: Arc<ConnectionTracker>,
}

impl Default for BringupContext {
    fn default() -> Self {
        Self::new(AdvertisingPolicy::default())
    }
}

impl BringupContext {
    pub fn new(policy: AdvertisingPolicy) -> Self {
        Self {
            state: BringupState::Idle,
            policy,
            identity: None,
            advertising: None,
            connections: Arc::new(ConnectionTracker::new()),
        }
    }

    /// Current state. `Connected` is reported while advertising with a live
    /// connection.
    pub fn state(&self) -> BringupState {
        match self.state {
            BringupState::Advertising
                if self.connections.state() == ConnectionState::Connected =>
            {
                BringupState::Connected
            }
            state => state,
        }
    }

    pub fn policy(&self) -> AdvertisingPolicy {
        self.policy
    }

    /// The cached identity address
    pub fn identity(&self) -> Option<&IdentityAddress> {
        self.identity.as_ref()
    }

    /// The configuration advertising was started with
    pub fn active_advertising(&self) -> Option<&AdvertisingConfig> {
        self.advertising.as_ref()
    }

    /// Tracker to subscribe to connection events
    pub fn connections(&self) -> &Arc<ConnectionTracker> {
        &self.connections
    }

    pub fn is_aborted(&self) -> bool {
        self.state == BringupState::Aborted
    }

    pub(crate) fn set_state(&mut self, state: BringupState) {
        debug!(from = %self.state, to = %state, "bring-up state change");
        self.state = state;
    }

    pub(crate) fn abort(&mut self) {
        self.set_state(BringupState::Aborted);
    }

    pub(crate) fn set_identity(&mut self, identity: IdentityAddress) {
        self.identity = Some(identity);
    }

    pub(crate) fn set_advertising(&mut self, config: AdvertisingConfig) {
        self.advertising = Some(config);
    }
}

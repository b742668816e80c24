//! Connection event subscribers
//!
//! The command channel hands every event that is not a command completion
//! to an `EventRouter`, which decodes connection and disconnection events
//! and fans them out to the registered `ConnectionEventSink`s. Sinks only
//! observe; nothing they do feeds back into bring-up.

use crate::address::{AddressType, DeviceAddress};
use crate::hci::constants::HCI_SUCCESS;
use crate::hci::packet::{DisconnectionComplete, HciEvent, LeConnectionComplete};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// The remote end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    pub handle: u16,
    /// Unknown when a disconnection arrives for a handle never seen connecting
    pub address: Option<DeviceAddress>,
    pub address_type: AddressType,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(f, "{} (handle 0x{:04x})", address, self.handle),
            None => write!(f, "handle 0x{:04x}", self.handle),
        }
    }
}

/// Receives connection notifications.
///
/// Called on whatever thread pumps controller events; implementations must
/// return promptly.
pub trait ConnectionEventSink: Send + Sync {
    fn on_connected(&self, peer: &Peer, status: u8);

    fn on_disconnected(&self, peer: &Peer, reason: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// What a `ConnectionTracker` last saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Number of live links
    pub connections: usize,
    /// Status of the most recent connection attempt
    pub last_status: Option<u8>,
    /// Reason of the most recent disconnection
    pub last_reason: Option<u8>,
}

#[derive(Debug, Default)]
struct TrackerState {
    peers: HashMap<u16, Peer>,
    last_status: Option<u8>,
    last_reason: Option<u8>,
}

/// Sink that records the live links and logs each event.
///
/// The state is `Connected` while at least one link is up.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    inner: Mutex<TrackerState>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> ConnectionState {
        if self.lock().peers.is_empty() {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let inner = self.lock();
        ConnectionStatus {
            state: if inner.peers.is_empty() {
                ConnectionState::Disconnected
            } else {
                ConnectionState::Connected
            },
            connections: inner.peers.len(),
            last_status: inner.last_status,
            last_reason: inner.last_reason,
        }
    }

    /// Peers with a live link, in handle order
    pub fn peers(&self) -> Vec<Peer> {
        let mut peers: Vec<Peer> = self.lock().peers.values().copied().collect();
        peers.sort_by_key(|p| p.handle);
        peers
    }
}

impl ConnectionEventSink for ConnectionTracker {
    fn on_connected(&self, peer: &Peer, status: u8) {
        let mut inner = self.lock();
        inner.last_status = Some(status);

        if status != HCI_SUCCESS {
            warn!("Connection failed (err 0x{:02x})", status);
            return;
        }

        info!(%peer, "Connected");
        inner.peers.insert(peer.handle, *peer);
    }

    fn on_disconnected(&self, peer: &Peer, reason: u8) {
        info!(%peer, "Disconnected (reason 0x{:02x})", reason);

        let mut inner = self.lock();
        inner.last_reason = Some(reason);
        inner.peers.remove(&peer.handle);
    }
}

/// A connection event after it was delivered to the subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected { peer: Peer, status: u8 },
    Disconnected { peer: Peer, reason: u8 },
}

/// Decodes connection events and notifies every subscriber
#[derive(Default)]
pub struct EventRouter {
    sinks: RwLock<Vec<Arc<dyn ConnectionEventSink>>>,
    peers: Mutex<HashMap<u16, Peer>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn ConnectionEventSink>) {
        self.sinks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(sink);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Peers with a live connection
    pub fn connected_peers(&self) -> Vec<Peer> {
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .copied()
            .collect()
    }

    /// Routes one event and returns the connection event it carried, if any
    pub fn dispatch(&self, event: &HciEvent) -> Option<ConnectionEvent> {
        if let Some(complete) = LeConnectionComplete::parse(event) {
            let peer = Peer {
                handle: complete.connection_handle,
                address: Some(DeviceAddress::new(complete.peer_address)),
                address_type: AddressType::from(complete.peer_address_type),
            };

            if complete.status == HCI_SUCCESS {
                self.peers
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(peer.handle, peer);
            }

            self.notify(|sink| sink.on_connected(&peer, complete.status));
            return Some(ConnectionEvent::Connected {
                peer,
                status: complete.status,
            });
        }

        if let Some(complete) = DisconnectionComplete::parse(event) {
            if complete.status != HCI_SUCCESS {
                // The link is still up; nothing to report
                debug!(
                    handle = complete.connection_handle,
                    status = complete.status,
                    "disconnection failed"
                );
                return None;
            }

            let peer = self
                .peers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&complete.connection_handle)
                .unwrap_or(Peer {
                    handle: complete.connection_handle,
                    address: None,
                    address_type: AddressType::Public,
                });

            self.notify(|sink| sink.on_disconnected(&peer, complete.reason));
            return Some(ConnectionEvent::Disconnected {
                peer,
                reason: complete.reason,
            });
        }

        debug!(event_code = event.event_code, "unhandled event");
        None
    }

    fn notify<F>(&self, f: F)
    where
        F: Fn(&dyn ConnectionEventSink),
    {
        // Clone the list so a sink may subscribe another sink
        let sinks = self.sinks.read().unwrap_or_else(|e| e.into_inner()).clone();
        for sink in &sinks {
            f(sink.as_ref());
        }
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("subscribers", &self.subscriber_count())
            .field("peers", &self.connected_peers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hci::constants::*;
    use crate::mock::{connection_complete, disconnection_complete};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConnectionEventSink for Recorder {
        fn on_connected(&self, peer: &Peer, status: u8) {
            self.events
                .lock()
                .unwrap()
                .push(format!("connected {} {:02x}", peer, status));
        }

        fn on_disconnected(&self, peer: &Peer, reason: u8) {
            self.events
                .lock()
                .unwrap()
                .push(format!("disconnected {} {:02x}", peer, reason));
        }
    }

    #[test]
    fn test_tracker_follows_connect_and_disconnect() {
        let router = EventRouter::new();
        let tracker = Arc::new(ConnectionTracker::new());
        router.subscribe(tracker.clone());

        assert_eq!(tracker.state(), ConnectionState::Disconnected);

        assert!(matches!(
            router.dispatch(&connection_complete(HCI_SUCCESS, 0x0040)),
            Some(ConnectionEvent::Connected { status: HCI_SUCCESS, .. })
        ));
        assert_eq!(tracker.state(), ConnectionState::Connected);
        let status = tracker.status();
        assert_eq!(status.last_status, Some(HCI_SUCCESS));
        assert_eq!(status.connections, 1);
        assert_eq!(
            tracker.peers()[0].address.map(|a| a.to_string()),
            Some("00:11:22:33:44:55".to_string())
        );
        assert_eq!(router.connected_peers().len(), 1);

        assert!(matches!(
            router.dispatch(&disconnection_complete(0x0040, HCI_ERR_REMOTE_USER_TERM_CONN)),
            Some(ConnectionEvent::Disconnected { reason: 0x13, .. })
        ));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert_eq!(tracker.status().last_reason, Some(0x13));
        assert!(router.connected_peers().is_empty());
    }

    #[test]
    fn test_tracker_counts_overlapping_links() {
        let router = EventRouter::new();
        let tracker = Arc::new(ConnectionTracker::new());
        router.subscribe(tracker.clone());

        router.dispatch(&connection_complete(HCI_SUCCESS, 0x0040));
        router.dispatch(&connection_complete(HCI_SUCCESS, 0x0041));
        assert_eq!(tracker.status().connections, 2);

        // The first link still holds the tracker in Connected
        router.dispatch(&disconnection_complete(0x0041, 0x08));
        assert_eq!(tracker.state(), ConnectionState::Connected);
        assert_eq!(tracker.peers().iter().map(|p| p.handle).collect::<Vec<_>>(), vec![0x0040]);

        router.dispatch(&disconnection_complete(0x0040, 0x13));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert_eq!(tracker.status().connections, 0);
    }

    #[test]
    fn test_failed_connection_is_informational() {
        let router = EventRouter::new();
        let tracker = Arc::new(ConnectionTracker::new());
        router.subscribe(tracker.clone());

        // Connection Failed to be Established
        router.dispatch(&connection_complete(0x3e, 0x0000));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert_eq!(tracker.status().last_status, Some(0x3e));
        assert!(router.connected_peers().is_empty());
    }

    #[test]
    fn test_every_subscriber_is_notified() {
        let router = EventRouter::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        router.subscribe(first.clone());
        router.subscribe(second.clone());
        assert_eq!(router.subscriber_count(), 2);

        router.dispatch(&connection_complete(HCI_SUCCESS, 0x0001));
        router.dispatch(&disconnection_complete(0x0001, 0x08));

        let expected = vec![
            "connected 00:11:22:33:44:55 (handle 0x0001) 00".to_string(),
            "disconnected 00:11:22:33:44:55 (handle 0x0001) 08".to_string(),
        ];
        assert_eq!(*first.events.lock().unwrap(), expected);
        assert_eq!(*second.events.lock().unwrap(), expected);
    }

    #[test]
    fn test_disconnect_for_unknown_handle() {
        let router = EventRouter::new();
        let recorder = Arc::new(Recorder::default());
        router.subscribe(recorder.clone());

        router.dispatch(&disconnection_complete(0x0007, 0x13));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["disconnected handle 0x0007 13".to_string()]
        );
    }

    #[test]
    fn test_other_events_are_not_routed() {
        let router = EventRouter::new();
        let recorder = Arc::new(Recorder::default());
        router.subscribe(recorder.clone());

        let event = HciEvent::new(EVT_CMD_COMPLETE, vec![1, 0x03, 0x0c, 0x00]);
        assert_eq!(router.dispatch(&event), None);
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}

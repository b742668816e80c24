//! Scripted controller used by the unit tests

use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::{HciEvent, HciTransport};
use byteorder::{ByteOrder, LittleEndian};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub const FACTORY_ADDRESS: [u8; 6] = [0x66, 0x55, 0x44, 0x33, 0x22, 0x11];

pub const PEER_ADDRESS: [u8; 6] = [0x55, 0x44, 0x33, 0x22, 0x11, 0x00];

#[derive(Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    pending: VecDeque<HciEvent>,
    failures: HashMap<u16, u8>,
    send_errors: HashSet<u16>,
    silent: HashSet<u16>,
    before_reply: HashMap<u16, Vec<HciEvent>>,
}

/// Answers every command with a Command Complete unless told otherwise.
///
/// Clones share state, so a test can keep one handle after moving another
/// into a channel.
#[derive(Clone, Default)]
pub struct MockController {
    state: Arc<Mutex<MockState>>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Complete `opcode` with a failing status
    pub fn fail(&self, opcode: u16, status: u8) {
        self.lock().failures.insert(opcode, status);
    }

    /// Make sending `opcode` fail at the transport
    pub fn reject_send(&self, opcode: u16) {
        self.lock().send_errors.insert(opcode);
    }

    /// Never answer `opcode`
    pub fn drop_reply(&self, opcode: u16) {
        self.lock().silent.insert(opcode);
    }

    /// Deliver `event` right before the completion of `opcode`
    pub fn inject_before(&self, opcode: u16, event: HciEvent) {
        self.lock().before_reply.entry(opcode).or_default().push(event);
    }

    /// Queue an unsolicited event
    pub fn inject(&self, event: HciEvent) {
        self.lock().pending.push_back(event);
    }

    pub fn sent_packets(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    pub fn sent_opcodes(&self) -> Vec<u16> {
        self.lock()
            .sent
            .iter()
            .map(|p| LittleEndian::read_u16(&p[1..3]))
            .collect()
    }

    /// Parameters of the last packet sent with `opcode`
    pub fn last_parameters(&self, opcode: u16) -> Option<Vec<u8>> {
        self.lock()
            .sent
            .iter()
            .rev()
            .find(|p| LittleEndian::read_u16(&p[1..3]) == opcode)
            .map(|p| p[4..].to_vec())
    }
}

impl HciTransport for MockController {
    fn send_packet(&self, packet: &[u8]) -> Result<(), HciError> {
        assert_eq!(packet[0], HCI_COMMAND_PKT);
        assert_eq!(packet[3] as usize, packet.len() - 4, "length byte");
        let opcode = LittleEndian::read_u16(&packet[1..3]);

        let mut state = self.lock();
        if state.send_errors.contains(&opcode) {
            return Err(HciError::SendError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "controller gone",
            )));
        }

        state.sent.push(packet.to_vec());

        if let Some(events) = state.before_reply.remove(&opcode) {
            state.pending.extend(events);
        }

        if state.silent.contains(&opcode) {
            return Ok(());
        }

        let status = state.failures.get(&opcode).copied().unwrap_or(HCI_SUCCESS);
        let extra: &[u8] = if opcode == OP_READ_BD_ADDR && status == HCI_SUCCESS {
            &FACTORY_ADDRESS
        } else {
            &[]
        };
        state.pending.push_back(command_complete(opcode, status, extra));
        Ok(())
    }

    fn read_event(&self, _timeout: Option<Duration>) -> Result<HciEvent, HciError> {
        self.lock().pending.pop_front().ok_or_else(|| {
            HciError::ReceiveError(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "no scripted event",
            ))
        })
    }
}

pub fn command_complete(opcode: u16, status: u8, extra: &[u8]) -> HciEvent {
    let mut params = vec![1];
    params.extend_from_slice(&opcode.to_le_bytes());
    params.push(status);
    params.extend_from_slice(extra);
    HciEvent::new(EVT_CMD_COMPLETE, params)
}

pub fn command_status(opcode: u16, status: u8) -> HciEvent {
    let mut params = vec![status, 1];
    params.extend_from_slice(&opcode.to_le_bytes());
    HciEvent::new(EVT_CMD_STATUS, params)
}

pub fn connection_complete(status: u8, handle: u16) -> HciEvent {
    let mut params = vec![EVT_LE_CONN_COMPLETE, status];
    params.extend_from_slice(&handle.to_le_bytes());
    params.push(0x01); // Role (peripheral)
    params.push(0x00); // Peer address type (public)
    params.extend_from_slice(&PEER_ADDRESS);
    params.extend_from_slice(&0x0018u16.to_le_bytes());
    params.extend_from_slice(&0x0000u16.to_le_bytes());
    params.extend_from_slice(&0x0048u16.to_le_bytes());
    params.push(0x00);
    HciEvent::new(EVT_LE_META_EVENT, params)
}

pub fn disconnection_complete(handle: u16, reason: u8) -> HciEvent {
    let mut params = vec![HCI_SUCCESS];
    params.extend_from_slice(&handle.to_le_bytes());
    params.push(reason);
    HciEvent::new(EVT_DISCONN_COMPLETE, params)
}

//! HCI packet structures and parsing
//!
//! This module contains structures and methods for handling HCI packets.

use crate::address::DeviceAddress;
use crate::hci::constants::*;
use byteorder::{ByteOrder, LittleEndian};

/// Length of the legacy advertising and scan response data fields
pub const ADV_DATA_LEN: usize = 31;

/// Common HCI Commands
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HciCommand {
    // Host Controller Commands (OGF: 0x03)
    Reset,
    SetEventMask { event_mask: u64 },

    // Informational Parameters (OGF: 0x04)
    ReadBdAddr,

    // LE Commands (OGF: 0x08)
    LeSetEventMask { event_mask: u64 },
    LeSetAdvertisingParameters {
        min_interval: u16,
        max_interval: u16,
        advertising_type: u8,
        own_address_type: u8,
        peer_address_type: u8,
        peer_address: [u8; 6],
        channel_map: u8,
        filter_policy: u8,
    },
    LeSetAdvertisingData { data: Vec<u8> },
    LeSetScanResponseData { data: Vec<u8> },
    LeSetAdvertisingEnable { enable: bool },

    // Vendor-specific Commands (OGF: 0x3F)
    VsWriteBdAddr { address: DeviceAddress },
}

impl HciCommand {
    /// Get the OGF and OCF for this command
    pub fn opcode_parts(&self) -> (u8, u16) {
        match self {
            Self::Reset => (OGF_HOST_CTL, OCF_RESET),
            Self::SetEventMask { .. } => (OGF_HOST_CTL, OCF_SET_EVENT_MASK),

            Self::ReadBdAddr => (OGF_INFO_PARAM, OCF_READ_BD_ADDR),

            Self::LeSetEventMask { .. } => (OGF_LE, OCF_LE_SET_EVENT_MASK),
            Self::LeSetAdvertisingParameters { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_PARAMETERS),
            Self::LeSetAdvertisingData { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_DATA),
            Self::LeSetScanResponseData { .. } => (OGF_LE, OCF_LE_SET_SCAN_RESPONSE_DATA),
            Self::LeSetAdvertisingEnable { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_ENABLE),

            Self::VsWriteBdAddr { .. } => (OGF_VENDOR, OCF_VS_WRITE_BD_ADDR),
        }
    }

    /// Get the 16-bit opcode for this command
    pub fn opcode(&self) -> u16 {
        let (ogf, ocf) = self.opcode_parts();
        opcode(ogf, ocf)
    }

    /// Append the raw parameter bytes to `out`
    fn write_parameters(&self, out: &mut Vec<u8>) {
        match self {
            Self::Reset | Self::ReadBdAddr => {}

            Self::SetEventMask { event_mask } | Self::LeSetEventMask { event_mask } => {
                out.extend_from_slice(&event_mask.to_le_bytes());
            }

            Self::LeSetAdvertisingParameters {
                min_interval,
                max_interval,
                advertising_type,
                own_address_type,
                peer_address_type,
                peer_address,
                channel_map,
                filter_policy,
            } => {
                out.extend_from_slice(&min_interval.to_le_bytes());
                out.extend_from_slice(&max_interval.to_le_bytes());
                out.push(*advertising_type);
                out.push(*own_address_type);
                out.push(*peer_address_type);
                out.extend_from_slice(peer_address);
                out.push(*channel_map);
                out.push(*filter_policy);
            }

            Self::LeSetAdvertisingData { data } | Self::LeSetScanResponseData { data } => {
                // Significant length followed by a zero padded 31 byte field
                let len = data.len().min(ADV_DATA_LEN);
                out.push(len as u8);
                out.extend_from_slice(&data[..len]);
                out.resize(out.len() + (ADV_DATA_LEN - len), 0);
            }

            Self::LeSetAdvertisingEnable { enable } => out.push(*enable as u8),

            Self::VsWriteBdAddr { address } => out.extend_from_slice(address.as_slice()),
        }
    }

    /// Convert the command to its raw parameter bytes
    pub fn parameters(&self) -> Vec<u8> {
        let mut params = Vec::new();
        self.write_parameters(&mut params);
        params
    }
}

/// HCI Event packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HciEvent {
    pub event_code: u8,
    pub parameter_total_length: u8,
    pub parameters: Vec<u8>,
}

impl HciEvent {
    /// Build an event from its code and parameters
    pub fn new(event_code: u8, parameters: Vec<u8>) -> Self {
        Self {
            event_code,
            parameter_total_length: parameters.len() as u8,
            parameters,
        }
    }

    /// Parse an HCI event from raw bytes (without the packet type byte)
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let event_code = data[0];
        let parameter_total_length = data[1];

        if data.len() < (parameter_total_length as usize + 2) {
            return None;
        }

        let parameters = data[2..(parameter_total_length as usize + 2)].to_vec();

        Some(HciEvent {
            event_code,
            parameter_total_length,
            parameters,
        })
    }
}

/// Command Complete event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComplete {
    pub num_hci_command_packets: u8,
    pub opcode: u16,
    pub status: u8,
    /// Return parameters, starting with the status byte
    pub return_parameters: Vec<u8>,
}

impl CommandComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_CMD_COMPLETE || event.parameters.len() < 3 {
            return None;
        }

        let return_parameters = event.parameters[3..].to_vec();
        // The NOP completion carries no return parameters
        let status = return_parameters.first().copied().unwrap_or(HCI_SUCCESS);

        Some(Self {
            num_hci_command_packets: event.parameters[0],
            opcode: LittleEndian::read_u16(&event.parameters[1..3]),
            status,
            return_parameters,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == HCI_SUCCESS
    }
}

/// Command Status event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub status: u8,
    pub num_hci_command_packets: u8,
    pub opcode: u16,
}

impl CommandStatus {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_CMD_STATUS || event.parameters.len() < 4 {
            return None;
        }

        Some(Self {
            status: event.parameters[0],
            num_hci_command_packets: event.parameters[1],
            opcode: LittleEndian::read_u16(&event.parameters[2..4]),
        })
    }
}

/// LE Connection Complete event data
///
/// Also parsed from the Enhanced Connection Complete subevent, whose
/// resolvable private addresses are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeConnectionComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub role: u8,
    pub peer_address_type: u8,
    pub peer_address: [u8; 6],
    pub conn_interval: u16,
    pub conn_latency: u16,
    pub supervision_timeout: u16,
    pub master_clock_accuracy: u8,
}

impl LeConnectionComplete {
    /// Parse an LE Connection Complete event from an HCI Meta Event
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_LE_META_EVENT || event.parameters.is_empty() {
            return None;
        }

        // Offset of the connection interval field
        let timing = match event.parameters[0] {
            EVT_LE_CONN_COMPLETE => 12,
            EVT_LE_ENHANCED_CONN_COMPLETE => 24,
            _ => return None,
        };

        let p = &event.parameters;
        if p.len() < timing + 7 {
            return None;
        }

        let mut peer_address = [0u8; 6];
        peer_address.copy_from_slice(&p[6..12]);

        Some(LeConnectionComplete {
            status: p[1],
            connection_handle: LittleEndian::read_u16(&p[2..4]) & 0x0fff,
            role: p[4],
            peer_address_type: p[5],
            peer_address,
            conn_interval: LittleEndian::read_u16(&p[timing..]),
            conn_latency: LittleEndian::read_u16(&p[timing + 2..]),
            supervision_timeout: LittleEndian::read_u16(&p[timing + 4..]),
            master_clock_accuracy: p[timing + 6],
        })
    }
}

/// Disconnection Complete event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectionComplete {
    pub status: u8,
    pub connection_handle: u16,
    pub reason: u8,
}

impl DisconnectionComplete {
    pub fn parse(event: &HciEvent) -> Option<Self> {
        if event.event_code != EVT_DISCONN_COMPLETE || event.parameters.len() < 4 {
            return None;
        }

        Some(DisconnectionComplete {
            status: event.parameters[0],
            connection_handle: LittleEndian::read_u16(&event.parameters[1..3]) & 0x0fff,
            reason: event.parameters[3],
        })
    }
}

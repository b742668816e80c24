//! HCI protocol constants
//!
//! This module contains constants used in the Bluetooth HCI protocol.

// HCI packet types
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_EVENT_PKT: u8 = 0x04;

// Command header: opcode (2) + parameter length (1)
pub const HCI_COMMAND_HDR_LEN: usize = 3;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Maximum size of an HCI event packet including the packet type byte
pub const HCI_MAX_EVENT_SIZE: usize = 258;

// OGF (Opcode Group Field) values
pub const OGF_HOST_CTL: u8 = 0x03;
pub const OGF_INFO_PARAM: u8 = 0x04;
pub const OGF_LE: u8 = 0x08;
pub const OGF_VENDOR: u8 = 0x3F;

// Host Controller Commands (OGF: 0x03)
pub const OCF_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_RESET: u16 = 0x0003;

// Informational Parameters (OGF: 0x04)
pub const OCF_READ_BD_ADDR: u16 = 0x0009;

// LE Command OCF values (OGF: 0x08)
pub const OCF_LE_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
pub const OCF_LE_SET_ADVERTISING_DATA: u16 = 0x0008;
pub const OCF_LE_SET_SCAN_RESPONSE_DATA: u16 = 0x0009;
pub const OCF_LE_SET_ADVERTISING_ENABLE: u16 = 0x000A;

// Vendor-specific commands (OGF: 0x3F)
pub const OCF_VS_WRITE_BD_ADDR: u16 = 0x0006;

// HCI Events
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta Events
pub const EVT_LE_CONN_COMPLETE: u8 = 0x01;
pub const EVT_LE_ENHANCED_CONN_COMPLETE: u8 = 0x0A;

// Status codes
pub const HCI_SUCCESS: u8 = 0x00;
pub const HCI_ERR_REMOTE_USER_TERM_CONN: u8 = 0x13;

// Event mask: Disconnection Complete, Hardware Error, LE Meta
pub const DEFAULT_EVENT_MASK: u64 = 0x2000_0000_0000_8010;

// LE event mask: Connection Complete, Connection Update Complete,
// Enhanced Connection Complete
pub const DEFAULT_LE_EVENT_MASK: u64 = 0x0000_0000_0000_0205;

/// Compose an opcode from its group and command fields
pub const fn opcode(ogf: u8, ocf: u16) -> u16 {
    ((ogf as u16) << 10) | (ocf & 0x03ff)
}

pub const OP_RESET: u16 = opcode(OGF_HOST_CTL, OCF_RESET);
pub const OP_SET_EVENT_MASK: u16 = opcode(OGF_HOST_CTL, OCF_SET_EVENT_MASK);
pub const OP_READ_BD_ADDR: u16 = opcode(OGF_INFO_PARAM, OCF_READ_BD_ADDR);
pub const OP_LE_SET_EVENT_MASK: u16 = opcode(OGF_LE, OCF_LE_SET_EVENT_MASK);
pub const OP_LE_SET_ADVERTISING_PARAMETERS: u16 = opcode(OGF_LE, OCF_LE_SET_ADVERTISING_PARAMETERS);
pub const OP_LE_SET_ADVERTISING_DATA: u16 = opcode(OGF_LE, OCF_LE_SET_ADVERTISING_DATA);
pub const OP_LE_SET_SCAN_RESPONSE_DATA: u16 = opcode(OGF_LE, OCF_LE_SET_SCAN_RESPONSE_DATA);
pub const OP_LE_SET_ADVERTISING_ENABLE: u16 = opcode(OGF_LE, OCF_LE_SET_ADVERTISING_ENABLE);
pub const OP_VS_WRITE_BD_ADDR: u16 = opcode(OGF_VENDOR, OCF_VS_WRITE_BD_ADDR);

// Advertising Data Types
pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_16BIT_SERVICE_UUID_PARTIAL: u8 = 0x02;
pub const AD_TYPE_16BIT_SERVICE_UUID_COMPLETE: u8 = 0x03;
pub const AD_TYPE_128BIT_SERVICE_UUID_PARTIAL: u8 = 0x06;
pub const AD_TYPE_128BIT_SERVICE_UUID_COMPLETE: u8 = 0x07;
pub const AD_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const AD_TYPE_TX_POWER_LEVEL: u8 = 0x0A;
pub const AD_TYPE_APPEARANCE: u8 = 0x19;
pub const AD_TYPE_MANUFACTURER_SPECIFIC: u8 = 0xFF;

/// Length plus type octet in front of every AD structure
pub const AD_HEADER_LEN: usize = 2;

// Advertising types (LE Set Advertising Parameters)
pub const ADV_IND: u8 = 0x00;
pub const ADV_DIRECT_IND: u8 = 0x01;
pub const ADV_SCAN_IND: u8 = 0x02;
pub const ADV_NONCONN_IND: u8 = 0x03;

// Advertising intervals, in units of 0.625 ms
pub const ADV_INTERVAL_MIN_DEFAULT: u16 = 0x00A0; // 100 ms
pub const ADV_INTERVAL_MAX_DEFAULT: u16 = 0x00F0; // 150 ms
pub const ADV_INTERVAL_LOWER_BOUND: u16 = 0x0020; // 20 ms
pub const ADV_INTERVAL_UPPER_BOUND: u16 = 0x4000; // 10.24 s

/// Microseconds per advertising interval unit
pub const ADV_INTERVAL_UNIT_US: u32 = 625;

/// Channels 37, 38 and 39
pub const ADV_CHANNEL_MAP_ALL: u8 = 0x07;

/// Process scan and connection requests from all devices
pub const ADV_FILTER_POLICY_NONE: u8 = 0x00;

/// Name advertised when none is configured
pub const DEFAULT_DEVICE_NAME: &str = "blueid";

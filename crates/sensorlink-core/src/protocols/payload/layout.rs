/// Every device type carries a fixed 12-byte little-endian body.
pub const PAYLOAD_LEN: usize = 12;

// hw_energy_switch: 6 pad, u8 voltage, u16 milliamps, u16 watts, 1 pad
pub const SWITCH_VOLTAGE_OFFSET: usize = 6;
pub const SWITCH_AMPERAGE_RANGE: std::ops::Range<usize> = 7..9;
pub const SWITCH_WATTAGE_RANGE: std::ops::Range<usize> = 9..11;
pub const AMPERAGE_DECIMALS: u32 = 3;

// hw_thermometer: 2 pad, u8 flags, 1 pad, i16 tenths of a degree, u8 humidity, 5 pad
pub const THERMO_FLAGS_OFFSET: usize = 2;
pub const THERMO_TEMPERATURE_RANGE: std::ops::Range<usize> = 4..6;
pub const THERMO_HUMIDITY_OFFSET: usize = 6;
pub const TEMPERATURE_DECIMALS: u32 = 1;

// sw_leak_detector / sw_smoke_detector: 2 pad, u8 flags, 9 pad
pub const DETECTOR_FLAGS_OFFSET: usize = 2;

pub const BATTERY_OK_BIT: u8 = 0;
pub const SENSOR_TRIPPED_BIT: u8 = 2;

pub const BATTERY_LEVEL_OK: i64 = 100;
pub const BATTERY_LEVEL_LOW: i64 = 0;

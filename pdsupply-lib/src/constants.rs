// Protocol constants for the PDSupply Solo

/// Advertised name of the peripheral
pub const DEVICE_NAME: &str = "PDSupply Solo";

/// Power supply protocol service
pub const SERVICE_UUID: u128 = 0xF3641400_00B0_4240_BA50_05CA45BF8ABC;

/// Data characteristic: commands are written to it, telemetry is notified from it
pub const CHARACTERISTIC_UUID: u128 = 0xF3641401_00B0_4240_BA50_05CA45BF8ABC;

/// Size of a host-to-device command frame (16 bytes)
pub const COMMAND_FRAME_SIZE: usize = 16;

/// Number of meaningful bytes at the start of a telemetry notification (16 bytes)
pub const TELEMETRY_FRAME_SIZE: usize = 16;

/// Largest notification the firmware sends; only the first 16 bytes carry fields
pub const MAX_NOTIFICATION_SIZE: usize = 64;

/// Number of samples in the display window
pub const WINDOW_LEN: usize = 100;

/// Default coalescing window for slider-style controls, in milliseconds
pub const DEFAULT_THROTTLE_MS: u64 = 50;

/// Default time a discovery sub-phase may stall before the session rescans
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 10_000;

/// Upper bound of the voltage setpoint (volts)
pub const DEFAULT_MAX_VOLTAGE: f32 = 12.0;

/// Upper bound of the current limit setpoint (milliamps)
pub const DEFAULT_MAX_CURRENT_MA: f32 = 1000.0;

use crate::error::ProtocolError;
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output state reported by the supply in every telemetry frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u32)]
pub enum OutputStatus {
    Good = 0x0A,
    Off = 0x0B,
    Overcurrent = 0x0C,
    High = 0x0D,
    Low = 0x0E,

    /// Firmware sent a code this driver does not know about
    #[num_enum(catch_all)]
    Unknown(u32),
}

// Until the first frame arrives the supply is assumed de-energized.
impl Default for OutputStatus {
    fn default() -> Self {
        OutputStatus::Off
    }
}

impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStatus::Good => write!(f, "good"),
            OutputStatus::Off => write!(f, "off"),
            OutputStatus::Overcurrent => write!(f, "overcurrent"),
            OutputStatus::High => write!(f, "high"),
            OutputStatus::Low => write!(f, "low"),
            OutputStatus::Unknown(code) => write!(f, "unknown ({code:#04x})"),
        }
    }
}

impl OutputStatus {
    pub fn code(self) -> u32 {
        self.into()
    }

    pub fn is_known(self) -> bool {
        !matches!(self, OutputStatus::Unknown(_))
    }

    /// Text for a status indicator. Anything that is neither good nor off is
    /// shown as a fault.
    pub fn label(self) -> &'static str {
        match self {
            OutputStatus::Good => "Output Enabled",
            OutputStatus::Off => "Output Off",
            _ => "Over Current",
        }
    }
}

/// One decoded device report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Device-assigned sequence number, restarts when the device reboots
    pub counter: u32,
    pub status: OutputStatus,
    /// Volts
    pub voltage: f32,
    /// Milliamps
    pub current: f32,
}

impl TelemetrySample {
    /// The status, or an error if the firmware reported an unrecognized code.
    pub fn checked_status(&self) -> Result<OutputStatus, ProtocolError> {
        match self.status {
            OutputStatus::Unknown(code) => Err(ProtocolError::UnknownStatusCode(code)),
            known => Ok(known),
        }
    }

    /// Output power in watts
    pub fn power_w(&self) -> f64 {
        self.voltage as f64 * self.current as f64 / 1000.0
    }
}

impl fmt::Display for TelemetrySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}: {:.3} V, {:.3} mA, {:.3} W, status {}",
            self.counter,
            self.voltage,
            self.current,
            self.power_w(),
            self.status
        )
    }
}

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

/// Action requested of the supply, the first word of every command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[repr(u32)]
pub enum StatusCommand {
    #[strum(to_string = "output on")]
    OutputOn = 0x1A,
    #[strum(to_string = "output off")]
    OutputOff = 0x1B,
    #[strum(to_string = "keep state")]
    KeepState = 0x1C,
    #[strum(to_string = "LED on")]
    LedOn = 0x1D,
    #[strum(to_string = "LED off")]
    LedOff = 0x1E,
}

impl StatusCommand {
    /// Numeric value sent on the wire
    pub fn code(self) -> u32 {
        self.into()
    }
}

/// Logical user control. Each one owns an independent coalescing slot in the
/// command sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Control {
    #[strum(to_string = "voltage")]
    Voltage,
    #[strum(to_string = "current")]
    Current,
    #[strum(to_string = "output")]
    Output,
}

/// Outgoing intent. Voltage and current are always encoded, even when the
/// device ignores them (output off).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub status: StatusCommand,
    /// Auxiliary output selector, always 0 with current firmware
    pub output: u32,
    /// Volts
    pub voltage: f32,
    /// Milliamps
    pub current: f32,
}

impl Command {
    pub fn new(status: StatusCommand, voltage: f32, current: f32) -> Self {
        Self {
            status,
            output: 0,
            voltage,
            current,
        }
    }

    /// The de-energized command sent on every fresh pairing.
    pub fn safe_off() -> Self {
        Self::new(StatusCommand::OutputOff, 0.0, 0.0)
    }

    pub fn keep_state(voltage: f32, current: f32) -> Self {
        Self::new(StatusCommand::KeepState, voltage, current)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2} V, {:.1} mA (output {})",
            self.status, self.voltage, self.current, self.output
        )
    }
}

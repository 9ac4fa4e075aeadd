//! Fixed-size frames exchanged with the supply.
//!
//! Both directions use 16 bytes of little-endian 32-bit words:
//!
//! | Offset | Command (host → device) | Telemetry (device → host) |
//! |--------|-------------------------|---------------------------|
//! | 0      | status code `u32`       | sample counter `u32`      |
//! | 4      | output selector `u32`   | status code `u32`         |
//! | 8      | voltage `f32` (V)       | voltage `f32` (V)         |
//! | 12     | current `f32` (mA)      | current `f32` (mA)        |
//!
//! Telemetry notifications may be up to 64 bytes long; only the first 16 bytes
//! carry fields and the remainder is ignored.

use crate::command::{Command, StatusCommand};
use crate::constants::{COMMAND_FRAME_SIZE, TELEMETRY_FRAME_SIZE};
use crate::error::DecodeError;
use crate::telemetry::{OutputStatus, TelemetrySample};
use zerocopy::byteorder::little_endian::{F32, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Wire layout of a command frame (16 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct CommandFrameRaw {
    pub status: U32,
    pub output: U32,
    pub voltage: F32, // Volts
    pub current: F32, // Milliamps
}

/// Wire layout of the meaningful prefix of a telemetry notification (16 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TelemetryFrameRaw {
    pub counter: U32,
    pub status: U32,
    pub voltage: F32, // Volts
    pub current: F32, // Milliamps
}

impl From<Command> for CommandFrameRaw {
    fn from(cmd: Command) -> Self {
        CommandFrameRaw {
            status: U32::new(cmd.status.code()),
            output: U32::new(cmd.output),
            voltage: F32::new(cmd.voltage),
            current: F32::new(cmd.current),
        }
    }
}

impl From<TelemetryFrameRaw> for TelemetrySample {
    fn from(raw: TelemetryFrameRaw) -> Self {
        TelemetrySample {
            counter: raw.counter.get(),
            status: OutputStatus::from(raw.status.get()),
            voltage: raw.voltage.get(),
            current: raw.current.get(),
        }
    }
}

impl From<TelemetrySample> for TelemetryFrameRaw {
    fn from(sample: TelemetrySample) -> Self {
        TelemetryFrameRaw {
            counter: U32::new(sample.counter),
            status: U32::new(sample.status.code()),
            voltage: F32::new(sample.voltage),
            current: F32::new(sample.current),
        }
    }
}

/// Encode a command. Never fails: every `Command` has exactly one frame.
pub fn encode_command(cmd: &Command) -> [u8; COMMAND_FRAME_SIZE] {
    let mut frame = [0u8; COMMAND_FRAME_SIZE];
    frame.copy_from_slice(CommandFrameRaw::from(*cmd).as_bytes());
    frame
}

/// Decode a telemetry notification from the first 16 bytes of `bytes`.
///
/// Unknown status codes are kept as [`OutputStatus::Unknown`] rather than
/// rejected.
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetrySample, DecodeError> {
    let (raw, _rest) = TelemetryFrameRaw::read_from_prefix(bytes).map_err(|_| DecodeError::TooShort {
        expected: TELEMETRY_FRAME_SIZE,
        actual: bytes.len(),
    })?;
    Ok(TelemetrySample::from(raw))
}

/// Encode a telemetry frame the way the firmware does.
pub fn encode_telemetry(sample: &TelemetrySample) -> [u8; TELEMETRY_FRAME_SIZE] {
    let mut frame = [0u8; TELEMETRY_FRAME_SIZE];
    frame.copy_from_slice(TelemetryFrameRaw::from(*sample).as_bytes());
    frame
}

/// Decode a command frame as the firmware sees it.
pub fn decode_command(bytes: &[u8]) -> Result<Command, DecodeError> {
    let (raw, _rest) = CommandFrameRaw::read_from_prefix(bytes).map_err(|_| DecodeError::TooShort {
        expected: COMMAND_FRAME_SIZE,
        actual: bytes.len(),
    })?;
    let code = raw.status.get();
    let status = StatusCommand::try_from(code).map_err(|_| DecodeError::UnknownCommand(code))?;
    Ok(Command {
        status,
        output: raw.output.get(),
        voltage: raw.voltage.get(),
        current: raw.current.get(),
    })
}

use crate::command::Control;
use thiserror::Error;

/// Failure to turn a raw frame into a structured value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Unknown command status code {0:#04x}")]
    UnknownCommand(u32),
}

/// A frame decoded fine but carries a value outside the known protocol.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown output status code {0:#04x}")]
    UnknownStatusCode(u32),
}

/// Errors reported by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Radio unavailable. Is Bluetooth powered on?")]
    RadioUnavailable,

    #[error("Peripheral not found: {0}")]
    PeripheralNotFound(String),

    #[error("Link error: {0}")]
    Link(String),

    #[error("Write failed: {0}")]
    Write(String),
}

/// Errors surfaced by the session to callers that opt into them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Not connected to a PDSupply")]
    NotConnected,

    #[error("Invalid {control} setpoint: {value}")]
    InvalidSetpoint { control: Control, value: f32 },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

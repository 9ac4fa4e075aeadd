pub mod buffer;
pub mod command;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod sender;
pub mod session;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-export the main types for easy access
pub use buffer::TelemetryBuffer;
pub use command::{Command, Control, StatusCommand};
pub use config::SessionConfig;
pub use device::PdSupply;
pub use error::{ConfigError, DecodeError, ProtocolError, SessionError, TransportError};
pub use frame::{decode_command, decode_telemetry, encode_command, encode_telemetry};
pub use ingest::{IngestStats, TelemetryHandle, TelemetryIngest, TelemetrySnapshot};
pub use sender::{CommandSender, SendOutcome};
pub use session::{Session, SessionPhase};
pub use telemetry::{OutputStatus, TelemetrySample};
pub use transport::{PeripheralId, Transport, TransportEvent, WriteMode};

//! Interface to the radio link.
//!
//! The driver never talks to a Bluetooth stack directly. An embedder
//! implements [`Transport`] over its platform API and feeds everything the
//! platform reports back into the session as [`TransportEvent`]s, one at a
//! time, in arrival order.

use crate::error::TransportError;
use bytes::Bytes;
use std::fmt;

/// Platform identifier of a discovered peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeripheralId(pub String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a write is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// The peripheral acknowledges the write
    WithResponse,
    WithoutResponse,
}

/// Requests the session makes of the radio. Completion is reported
/// asynchronously through [`TransportEvent`]; an `Err` here means the request
/// could not even be issued.
pub trait Transport {
    /// Begin a passive scan; found peripherals arrive as `PeripheralFound`.
    fn start_scan(&mut self) -> Result<(), TransportError>;

    fn stop_scan(&mut self);

    fn connect(&mut self, peripheral: &PeripheralId) -> Result<(), TransportError>;

    /// Tear the link down. Does not wait for the platform to confirm.
    fn disconnect(&mut self, peripheral: &PeripheralId);

    fn discover_services(&mut self, peripheral: &PeripheralId, service: u128) -> Result<(), TransportError>;

    fn discover_characteristics(
        &mut self,
        peripheral: &PeripheralId,
        service: u128,
        characteristic: u128,
    ) -> Result<(), TransportError>;

    /// Enable notifications on the characteristic. Later writes go to it too.
    fn open_notify_channel(
        &mut self,
        peripheral: &PeripheralId,
        service: u128,
        characteristic: u128,
    ) -> Result<(), TransportError>;

    fn write(&mut self, frame: &[u8], mode: WriteMode) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn start_scan(&mut self) -> Result<(), TransportError> {
        (**self).start_scan()
    }

    fn stop_scan(&mut self) {
        (**self).stop_scan()
    }

    fn connect(&mut self, peripheral: &PeripheralId) -> Result<(), TransportError> {
        (**self).connect(peripheral)
    }

    fn disconnect(&mut self, peripheral: &PeripheralId) {
        (**self).disconnect(peripheral)
    }

    fn discover_services(&mut self, peripheral: &PeripheralId, service: u128) -> Result<(), TransportError> {
        (**self).discover_services(peripheral, service)
    }

    fn discover_characteristics(
        &mut self,
        peripheral: &PeripheralId,
        service: u128,
        characteristic: u128,
    ) -> Result<(), TransportError> {
        (**self).discover_characteristics(peripheral, service, characteristic)
    }

    fn open_notify_channel(
        &mut self,
        peripheral: &PeripheralId,
        service: u128,
        characteristic: u128,
    ) -> Result<(), TransportError> {
        (**self).open_notify_channel(peripheral, service, characteristic)
    }

    fn write(&mut self, frame: &[u8], mode: WriteMode) -> Result<(), TransportError> {
        (**self).write(frame, mode)
    }
}

/// Everything the platform can report to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    RadioAvailable,
    RadioUnavailable,
    PeripheralFound {
        peripheral: PeripheralId,
        name: Option<String>,
    },
    /// The link to a peripheral is up
    Connected { peripheral: PeripheralId },
    ServicesDiscovered {
        peripheral: PeripheralId,
        services: Vec<u128>,
    },
    CharacteristicsDiscovered {
        peripheral: PeripheralId,
        service: u128,
        characteristics: Vec<u128>,
    },
    /// A notification payload from the data characteristic
    BytesReceived(Bytes),
    Disconnected { peripheral: PeripheralId },
    /// The peripheral rejected or never acknowledged a write. The session
    /// drops the link and rescans.
    WriteFailed { reason: String },
}

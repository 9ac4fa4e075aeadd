//! Connection lifecycle for one supply.
//!
//! ```text
//! Disconnected --start--> Discovering --name match--> AwaitingServiceDiscovery
//!      ^                      ^                              |
//!      |                      |                      service found
//!      |                      |                              v
//!      |                      +--- link lost ---- AwaitingCharacteristicDiscovery
//!      |                      |                              |
//!      |                      |                  characteristic found
//!      |                      |                              v
//!      +-- radio off ---------+------- link lost ------- Connected
//! ```
//!
//! Every transition is driven by a call on [`Session`]: `start`, `stop`,
//! `disconnect`, `handle_event` for platform callbacks, and `poll` for the
//! embedder's timer. Only `Connected` allows commands and live telemetry.

use crate::command::{Command, Control};
use crate::config::{SessionConfig, format_uuid};
use crate::error::{SessionError, TransportError};
use crate::ingest::{IngestStats, TelemetryHandle, TelemetryIngest};
use crate::sender::{CommandSender, SendOutcome};
use crate::transport::{PeripheralId, Transport, TransportEvent};
use serde::Serialize;
use std::time::Instant;
use strum_macros::Display;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum SessionPhase {
    Disconnected,
    Discovering,
    AwaitingServiceDiscovery,
    AwaitingCharacteristicDiscovery,
    Connected,
}

impl SessionPhase {
    fn is_awaiting(self) -> bool {
        matches!(
            self,
            SessionPhase::AwaitingServiceDiscovery | SessionPhase::AwaitingCharacteristicDiscovery
        )
    }
}

pub struct Session<T: Transport> {
    config: SessionConfig,
    transport: T,
    phase: SessionPhase,
    phase_since: Instant,
    /// Set by `start`, cleared by `stop`. Controls automatic rescans.
    started: bool,
    radio_available: bool,
    peripheral: Option<PeripheralId>,
    sender: CommandSender,
    ingest: TelemetryIngest,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            sender: CommandSender::new(&config),
            ingest: TelemetryIngest::new(config.pin_window_origin),
            config,
            transport,
            phase: SessionPhase::Disconnected,
            phase_since: Instant::now(),
            started: false,
            radio_available: true,
            peripheral: None,
        }
    }

    /// Begin looking for the supply. Only acts from `Disconnected`.
    pub fn start(&mut self, now: Instant) {
        if self.phase != SessionPhase::Disconnected {
            debug!(phase = %self.phase, "start() ignored, session already running");
            return;
        }
        self.started = true;
        if self.radio_available {
            self.begin_scan(now);
        } else {
            warn!("Bluetooth not available, waiting for the radio");
        }
    }

    /// Tear everything down and stay disconnected until the next `start`.
    pub fn stop(&mut self, now: Instant) {
        self.started = false;
        if self.phase == SessionPhase::Discovering {
            self.transport.stop_scan();
        }
        if let Some(peripheral) = self.peripheral.clone() {
            self.transport.disconnect(&peripheral);
        }
        self.release_link();
        self.set_phase(SessionPhase::Disconnected, now);
    }

    /// Drop the link to the supply and rescan. Unconfirmed writes are abandoned.
    pub fn disconnect(&mut self, now: Instant) {
        let Some(peripheral) = self.peripheral.clone() else {
            debug!(phase = %self.phase, "disconnect() with no peripheral attached");
            return;
        };
        info!(%peripheral, "Disconnecting");
        self.transport.disconnect(&peripheral);
        self.release_link();
        self.resume(now);
    }

    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::RadioAvailable => {
                self.radio_available = true;
                if self.started && self.phase == SessionPhase::Disconnected {
                    self.begin_scan(now);
                }
            }
            TransportEvent::RadioUnavailable => {
                warn!("Bluetooth not available");
                self.radio_available = false;
                self.release_link();
                self.set_phase(SessionPhase::Disconnected, now);
            }
            TransportEvent::PeripheralFound { peripheral, name } => {
                if self.phase != SessionPhase::Discovering {
                    trace!(%peripheral, "Ignoring advertisement outside discovery");
                } else if name.as_deref() == Some(self.config.device_name.as_str()) {
                    self.connect_to(peripheral, now);
                } else {
                    trace!(%peripheral, ?name, "Ignoring peripheral");
                }
            }
            TransportEvent::Connected { peripheral } => {
                if self.phase != SessionPhase::AwaitingServiceDiscovery || !self.is_current(&peripheral) {
                    debug!(%peripheral, phase = %self.phase, "Unexpected connect event");
                    return;
                }
                info!(%peripheral, "Connected");
                if let Err(e) = self.transport.discover_services(&peripheral, self.config.service_uuid) {
                    self.link_failed(e, now);
                }
            }
            TransportEvent::ServicesDiscovered { peripheral, services } => {
                if self.phase != SessionPhase::AwaitingServiceDiscovery || !self.is_current(&peripheral) {
                    debug!(%peripheral, phase = %self.phase, "Unexpected service discovery");
                    return;
                }
                if !services.contains(&self.config.service_uuid) {
                    warn!(
                        service = format_uuid(self.config.service_uuid),
                        "Power supply service not found"
                    );
                    return;
                }
                info!("Found power supply service");
                match self.transport.discover_characteristics(
                    &peripheral,
                    self.config.service_uuid,
                    self.config.characteristic_uuid,
                ) {
                    Ok(()) => self.set_phase(SessionPhase::AwaitingCharacteristicDiscovery, now),
                    Err(e) => self.link_failed(e, now),
                }
            }
            TransportEvent::CharacteristicsDiscovered {
                peripheral,
                service,
                characteristics,
            } => {
                if self.phase != SessionPhase::AwaitingCharacteristicDiscovery || !self.is_current(&peripheral) {
                    debug!(%peripheral, phase = %self.phase, "Unexpected characteristic discovery");
                    return;
                }
                if service == self.config.service_uuid && characteristics.contains(&self.config.characteristic_uuid) {
                    self.enter_connected(peripheral, now);
                } else {
                    debug!(service = format_uuid(service), "Data characteristic not in this batch");
                }
            }
            TransportEvent::BytesReceived(bytes) => {
                if self.phase == SessionPhase::Connected {
                    if let Err(e) = self.ingest.on_bytes_received(&bytes) {
                        trace!("Notification not ingested: {}", e);
                    }
                } else {
                    debug!(len = bytes.len(), phase = %self.phase, "Dropping notification while not connected");
                }
            }
            TransportEvent::Disconnected { peripheral } => {
                if !self.is_current(&peripheral) {
                    debug!(%peripheral, "Disconnect for a peripheral we no longer track");
                    return;
                }
                info!(%peripheral, "Peripheral disconnected");
                self.release_link();
                self.resume(now);
            }
            TransportEvent::WriteFailed { reason } => {
                if self.peripheral.is_none() {
                    debug!(phase = %self.phase, "Write failure with no peripheral attached: {}", reason);
                    return;
                }
                self.link_failed(TransportError::Write(reason), now);
            }
        }
    }

    /// Timer hook: flushes coalesced commands and enforces the discovery timeout.
    pub fn poll(&mut self, now: Instant) {
        match self.phase {
            SessionPhase::Connected => {
                self.sender.flush_due(&mut self.transport, now);
            }
            phase if phase.is_awaiting() => {
                if let Some(timeout) = self.config.discovery_timeout() {
                    if now.saturating_duration_since(self.phase_since) >= timeout {
                        warn!(%phase, ?timeout, "Discovery stalled, rescanning");
                        if let Some(peripheral) = self.peripheral.clone() {
                            self.transport.disconnect(&peripheral);
                        }
                        self.release_link();
                        self.resume(now);
                    }
                }
            }
            _ => {}
        }
    }

    /// Earliest instant at which `poll` has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            SessionPhase::Connected => self.sender.next_deadline(),
            phase if phase.is_awaiting() => self.config.discovery_timeout().map(|t| self.phase_since + t),
            _ => None,
        }
    }

    /// Send a command, silently dropping it when no supply is connected.
    pub fn send(&mut self, control: Control, command: Command, now: Instant) -> Result<SendOutcome, SessionError> {
        match self.try_send(control, command, now) {
            Err(SessionError::NotConnected) => {
                debug!(%control, "Not connected, command dropped: {}", command);
                Ok(SendOutcome::Dropped)
            }
            other => other,
        }
    }

    /// Like [`Session::send`] but reports `NotConnected` instead of dropping.
    pub fn try_send(&mut self, control: Control, command: Command, now: Instant) -> Result<SendOutcome, SessionError> {
        if self.phase != SessionPhase::Connected {
            return Err(SessionError::NotConnected);
        }
        self.sender.submit(&mut self.transport, control, command, now)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// False after the transport reported the radio off or refused to scan.
    pub fn is_radio_available(&self) -> bool {
        self.radio_available
    }

    pub fn peripheral(&self) -> Option<&PeripheralId> {
        self.peripheral.as_ref()
    }

    pub fn telemetry(&self) -> TelemetryHandle {
        self.ingest.handle()
    }

    pub fn ingest_stats(&self) -> IngestStats {
        self.ingest.stats()
    }

    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn set_phase(&mut self, phase: SessionPhase, now: Instant) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "Session phase change");
        }
        self.phase = phase;
        self.phase_since = now;
    }

    fn is_current(&self, peripheral: &PeripheralId) -> bool {
        self.peripheral.as_ref() == Some(peripheral)
    }

    fn begin_scan(&mut self, now: Instant) {
        match self.transport.start_scan() {
            Ok(()) => {
                info!(name = %self.config.device_name, "Scanning");
                self.set_phase(SessionPhase::Discovering, now);
            }
            Err(TransportError::RadioUnavailable) => {
                warn!("Bluetooth not available");
                self.radio_available = false;
                self.set_phase(SessionPhase::Disconnected, now);
            }
            Err(e) => {
                warn!("Could not start scanning: {}", e);
                self.set_phase(SessionPhase::Disconnected, now);
            }
        }
    }

    fn connect_to(&mut self, peripheral: PeripheralId, now: Instant) {
        match self.transport.connect(&peripheral) {
            Ok(()) => {
                self.transport.stop_scan();
                info!(%peripheral, "PDSupply found, connecting");
                self.peripheral = Some(peripheral);
                self.set_phase(SessionPhase::AwaitingServiceDiscovery, now);
            }
            Err(e) => warn!(%peripheral, "Connect request failed, still scanning: {}", e),
        }
    }

    fn enter_connected(&mut self, peripheral: PeripheralId, now: Instant) {
        if let Err(e) = self.transport.open_notify_channel(
            &peripheral,
            self.config.service_uuid,
            self.config.characteristic_uuid,
        ) {
            self.link_failed(e, now);
            return;
        }

        self.ingest.reset();
        self.ingest.set_live(true);
        self.set_phase(SessionPhase::Connected, now);

        // A fresh pairing always starts de-energized
        match self.sender.transmit(&mut self.transport, &Command::safe_off()) {
            Ok(()) => info!("Voltage and current zeroed"),
            Err(e) => warn!("Failed to zero the output: {}", e),
        }
        info!(%peripheral, "Paired with PDSupply");
    }

    fn link_failed(&mut self, error: TransportError, now: Instant) {
        warn!(phase = %self.phase, "Link failed, rescanning: {}", error);
        if let Some(peripheral) = self.peripheral.clone() {
            self.transport.disconnect(&peripheral);
        }
        self.release_link();
        self.resume(now);
    }

    /// Forget the peripheral, abandon pending commands and clear telemetry.
    fn release_link(&mut self) {
        self.peripheral = None;
        self.sender.abandon();
        self.ingest.set_live(false);
        self.ingest.reset();
    }

    fn resume(&mut self, now: Instant) {
        if self.started && self.radio_available {
            self.begin_scan(now);
        } else {
            self.set_phase(SessionPhase::Disconnected, now);
        }
    }
}

use crate::command::{Command, Control, StatusCommand};
use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::ingest::{TelemetryHandle, TelemetrySnapshot};
use crate::sender::SendOutcome;
use crate::session::{Session, SessionPhase};
use crate::transport::{Transport, TransportEvent};
use std::time::Instant;
use tracing::info;

/// A PDSupply Solo as seen by an application.
///
/// Remembers the voltage and current setpoints the user asked for, whether or
/// not a supply is connected, and sends both with every command the way the
/// firmware expects. Owned by the application; there is no global instance.
pub struct PdSupply<T: Transport> {
    session: Session<T>,
    voltage_setpoint: f32,
    current_setpoint: f32,
}

impl<T: Transport> PdSupply<T> {
    pub fn new(transport: T, config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            session: Session::new(transport, config),
            voltage_setpoint: 0.0,
            current_setpoint: 0.0,
        })
    }

    pub fn start(&mut self, now: Instant) {
        self.session.start(now);
    }

    pub fn stop(&mut self, now: Instant) {
        self.session.stop(now);
    }

    pub fn disconnect(&mut self, now: Instant) {
        self.session.disconnect(now);
    }

    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        self.session.handle_event(event, now);
    }

    pub fn poll(&mut self, now: Instant) {
        self.session.poll(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    /// Change the voltage setpoint (volts). Rapid changes are coalesced.
    pub fn set_voltage(&mut self, volts: f32, now: Instant) -> Result<SendOutcome, SessionError> {
        self.voltage_setpoint = self.checked_setpoint(Control::Voltage, volts)?;
        let command = Command::keep_state(self.voltage_setpoint, self.current_setpoint);
        self.session.send(Control::Voltage, command, now)
    }

    /// Change the current limit (milliamps). Rapid changes are coalesced.
    pub fn set_current_limit(&mut self, milliamps: f32, now: Instant) -> Result<SendOutcome, SessionError> {
        self.current_setpoint = self.checked_setpoint(Control::Current, milliamps)?;
        let command = Command::keep_state(self.voltage_setpoint, self.current_setpoint);
        self.session.send(Control::Current, command, now)
    }

    pub fn output_on(&mut self, now: Instant) -> Result<SendOutcome, SessionError> {
        info!(
            voltage = self.voltage_setpoint,
            current = self.current_setpoint,
            "Enabling output"
        );
        self.send_status(StatusCommand::OutputOn, now)
    }

    pub fn output_off(&mut self, now: Instant) -> Result<SendOutcome, SessionError> {
        info!("Disabling output");
        self.send_status(StatusCommand::OutputOff, now)
    }

    pub fn set_led(&mut self, on: bool, now: Instant) -> Result<SendOutcome, SessionError> {
        let status = if on { StatusCommand::LedOn } else { StatusCommand::LedOff };
        self.send_status(status, now)
    }

    /// `(volts, milliamps)` last requested by the user
    pub fn setpoints(&self) -> (f32, f32) {
        (self.voltage_setpoint, self.current_setpoint)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn telemetry(&self) -> TelemetryHandle {
        self.session.telemetry()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.session.telemetry().snapshot()
    }

    /// Indicator text for the latest reported output status
    pub fn status_label(&self) -> &'static str {
        self.session.telemetry().status().label()
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    fn send_status(&mut self, status: StatusCommand, now: Instant) -> Result<SendOutcome, SessionError> {
        let command = Command::new(status, self.voltage_setpoint, self.current_setpoint);
        self.session.send(Control::Output, command, now)
    }

    fn checked_setpoint(&self, control: Control, value: f32) -> Result<f32, SessionError> {
        if !value.is_finite() {
            return Err(SessionError::InvalidSetpoint { control, value });
        }
        let config = self.session.config();
        let max = match control {
            Control::Current => config.max_current_ma,
            _ => config.max_voltage,
        };
        Ok(value.clamp(0.0, max))
    }
}

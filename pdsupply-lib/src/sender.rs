use crate::command::{Command, Control};
use crate::config::SessionConfig;
use crate::error::{SessionError, TransportError};
use crate::frame::encode_command;
use crate::transport::{Transport, WriteMode};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What happened to a command handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Encoded and handed to the transport
    Written,
    /// Held in its control's slot until the coalescing window closes
    Coalesced,
    /// Discarded because no supply is connected
    Dropped,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    command: Command,
    due: Instant,
}

/// Encodes commands and writes them to the transport.
///
/// Voltage and current changes are coalesced per control: the first request
/// opens a window of `throttle_ms`, later requests replace the pending
/// command, and [`CommandSender::flush_due`] writes whatever is pending once
/// the window has closed. Output and LED commands are written immediately.
/// Any submitted command refreshes the setpoints of every pending frame, so
/// the last frame to reach the device always carries the newest values.
#[derive(Debug)]
pub struct CommandSender {
    interval: Duration,
    max_voltage: f32,
    max_current: f32,
    voltage: Option<Pending>,
    current: Option<Pending>,
    writes: u64,
}

impl CommandSender {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            interval: config.throttle_interval(),
            max_voltage: config.max_voltage,
            max_current: config.max_current_ma,
            voltage: None,
            current: None,
            writes: 0,
        }
    }

    /// Reject non-finite setpoints and clamp the rest into the supported range.
    pub fn validate(&self, command: Command) -> Result<Command, SessionError> {
        if !command.voltage.is_finite() {
            return Err(SessionError::InvalidSetpoint {
                control: Control::Voltage,
                value: command.voltage,
            });
        }
        if !command.current.is_finite() {
            return Err(SessionError::InvalidSetpoint {
                control: Control::Current,
                value: command.current,
            });
        }

        let voltage = command.voltage.clamp(0.0, self.max_voltage);
        let current = command.current.clamp(0.0, self.max_current);
        if voltage != command.voltage || current != command.current {
            warn!(
                requested_v = command.voltage,
                requested_ma = command.current,
                voltage,
                current,
                "Setpoint out of range, clamped"
            );
        }
        Ok(Command {
            voltage,
            current,
            ..command
        })
    }

    pub fn submit<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        control: Control,
        command: Command,
        now: Instant,
    ) -> Result<SendOutcome, SessionError> {
        let command = self.validate(command)?;
        let interval = self.interval;

        // Every frame carries both setpoints, so pending frames must not
        // hold an older copy of either one
        for pending in [&mut self.voltage, &mut self.current].into_iter().flatten() {
            pending.command.voltage = command.voltage;
            pending.command.current = command.current;
        }

        let slot = match control {
            Control::Output => {
                self.transmit(transport, &command)?;
                return Ok(SendOutcome::Written);
            }
            Control::Voltage => &mut self.voltage,
            Control::Current => &mut self.current,
        };

        if let Some(pending) = slot.as_mut() {
            pending.command = command;
        } else {
            *slot = Some(Pending {
                command,
                due: now + interval,
            });
        }
        Ok(SendOutcome::Coalesced)
    }

    /// Write every pending command whose window has closed, earliest first.
    /// Returns how many frames reached the transport.
    pub fn flush_due<T: Transport + ?Sized>(&mut self, transport: &mut T, now: Instant) -> usize {
        let mut due: Vec<Pending> = [&mut self.voltage, &mut self.current]
            .into_iter()
            .filter(|slot| slot.is_some_and(|p| p.due <= now))
            .filter_map(|slot| slot.take())
            .collect();
        due.sort_by_key(|p| p.due);

        let mut written = 0;
        for pending in due {
            match self.transmit(transport, &pending.command) {
                Ok(()) => written += 1,
                Err(e) => warn!("Coalesced command lost: {}", e),
            }
        }
        written
    }

    /// Encode and write one command right away.
    pub fn transmit<T: Transport + ?Sized>(&mut self, transport: &mut T, command: &Command) -> Result<(), TransportError> {
        let frame = encode_command(command);
        debug!(bytes = hex::encode(frame), "Command write: {}", command);
        transport.write(&frame, WriteMode::WithResponse)?;
        self.writes += 1;
        Ok(())
    }

    /// Drop everything pending. Returns how many commands were abandoned.
    pub fn abandon(&mut self) -> usize {
        let abandoned = self.voltage.take().is_some() as usize + self.current.take().is_some() as usize;
        if abandoned > 0 {
            debug!(abandoned, "Abandoning pending commands");
        }
        abandoned
    }

    /// Earliest time at which [`CommandSender::flush_due`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.voltage, self.current].iter().flatten().map(|p| p.due).min()
    }

    pub fn pending(&self, control: Control) -> Option<Command> {
        match control {
            Control::Voltage => self.voltage.map(|p| p.command),
            Control::Current => self.current.map(|p| p.command),
            Control::Output => None,
        }
    }

    /// Frames handed to the transport since creation
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

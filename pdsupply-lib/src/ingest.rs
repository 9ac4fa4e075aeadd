use crate::buffer::TelemetryBuffer;
use crate::error::DecodeError;
use crate::frame::decode_telemetry;
use crate::telemetry::{OutputStatus, TelemetrySample};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Counters describing the telemetry stream of the current connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Frames decoded and appended
    pub accepted: u64,
    /// Frames dropped because they could not be decoded
    pub dropped: u64,
    /// Times the sample counter went backwards (device restart)
    pub counter_regressions: u64,
}

#[derive(Debug, Default)]
struct TelemetryState {
    buffer: TelemetryBuffer,
    status: OutputStatus,
    last_counter: Option<u32>,
    live: bool,
    stats: IngestStats,
}

/// Consistent copy of everything a display needs, taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub live: bool,
    pub status: OutputStatus,
    pub latest_voltage: f64,
    pub latest_current: f64,
    pub last_counter: Option<u32>,
    pub samples: usize,
    pub window_voltage: Vec<f64>,
    pub window_current: Vec<f64>,
    pub stats: IngestStats,
}

/// Read side of the telemetry state. Cheap to clone and safe to hand to
/// another thread; every read sees a whole sample or none of it.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    shared: Arc<RwLock<TelemetryState>>,
}

impl TelemetryHandle {
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let state = self.shared.read();
        let (window_voltage, window_current) = state.buffer.window();
        TelemetrySnapshot {
            live: state.live,
            status: state.status,
            latest_voltage: state.buffer.latest_voltage(),
            latest_current: state.buffer.latest_current(),
            last_counter: state.last_counter,
            samples: state.buffer.len(),
            window_voltage: window_voltage.to_vec(),
            window_current: window_current.to_vec(),
            stats: state.stats,
        }
    }

    /// Run `f` against the buffer while holding the read lock.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&TelemetryBuffer) -> R) -> R {
        f(&self.shared.read().buffer)
    }

    pub fn status(&self) -> OutputStatus {
        self.shared.read().status
    }

    pub fn is_live(&self) -> bool {
        self.shared.read().live
    }
}

/// Write side: turns raw notifications into buffered samples.
#[derive(Debug)]
pub struct TelemetryIngest {
    shared: Arc<RwLock<TelemetryState>>,
}

impl TelemetryIngest {
    pub fn new(pin_window_origin: bool) -> Self {
        let state = TelemetryState {
            buffer: TelemetryBuffer::new(pin_window_origin),
            ..Default::default()
        };
        Self {
            shared: Arc::new(RwLock::new(state)),
        }
    }

    pub fn handle(&self) -> TelemetryHandle {
        TelemetryHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Decode one notification and append it. A frame that fails to decode
    /// leaves every piece of state untouched apart from the drop counter.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> Result<TelemetrySample, DecodeError> {
        let sample = match decode_telemetry(bytes) {
            Ok(sample) => sample,
            Err(e) => {
                debug!(bytes = hex::encode(bytes), "Dropping telemetry frame: {}", e);
                self.shared.write().stats.dropped += 1;
                return Err(e);
            }
        };

        if !sample.status.is_known() {
            debug!(code = sample.status.code(), "Telemetry carries an unknown status code");
        }

        let mut state = self.shared.write();
        if let Some(previous) = state.last_counter {
            if sample.counter < previous {
                debug!(previous, current = sample.counter, "Sample counter went backwards, device restarted?");
                state.stats.counter_regressions += 1;
            }
        }
        state.buffer.append(&sample);
        state.status = sample.status;
        state.last_counter = Some(sample.counter);
        state.stats.accepted += 1;
        trace!("{}", sample);

        Ok(sample)
    }

    /// Clear history, latest values and diagnostics.
    pub fn reset(&mut self) {
        let mut state = self.shared.write();
        state.buffer.reset();
        state.status = OutputStatus::default();
        state.last_counter = None;
        state.stats = IngestStats::default();
    }

    /// Mark whether samples come from a live, fully set-up link.
    pub fn set_live(&mut self, live: bool) {
        self.shared.write().live = live;
    }

    pub fn stats(&self) -> IngestStats {
        self.shared.read().stats
    }
}

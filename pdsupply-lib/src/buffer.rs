use crate::constants::WINDOW_LEN;
use crate::telemetry::TelemetrySample;

/// History of one connection's telemetry plus the fixed display window.
///
/// The window holds the most recent [`WINDOW_LEN`] samples, oldest first,
/// left-padded with zeros. With `pin_origin` set, slot 0 of both windows is
/// forced to 0 after every append so a chart's axis does not rescale on a
/// single glitched sample.
///
/// Voltage and current arrive as `f32` and are stored widened to `f64`.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    voltage_history: Vec<f64>,
    current_history: Vec<f64>,
    counters: Vec<u32>,
    window_voltage: [f64; WINDOW_LEN],
    window_current: [f64; WINDOW_LEN],
    latest_voltage: f64,
    latest_current: f64,
    pin_origin: bool,
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TelemetryBuffer {
    pub fn new(pin_origin: bool) -> Self {
        Self {
            voltage_history: Vec::new(),
            current_history: Vec::new(),
            counters: Vec::new(),
            window_voltage: [0.0; WINDOW_LEN],
            window_current: [0.0; WINDOW_LEN],
            latest_voltage: 0.0,
            latest_current: 0.0,
            pin_origin,
        }
    }

    pub fn append(&mut self, sample: &TelemetrySample) {
        let voltage = sample.voltage as f64;
        let current = sample.current as f64;

        self.voltage_history.push(voltage);
        self.current_history.push(current);
        self.counters.push(sample.counter);

        fill_window(&mut self.window_voltage, &self.voltage_history);
        fill_window(&mut self.window_current, &self.current_history);

        if self.pin_origin {
            self.window_voltage[0] = 0.0;
            self.window_current[0] = 0.0;
        }

        self.latest_voltage = voltage;
        self.latest_current = current;
    }

    /// Cached `(voltage, current)` display windows.
    pub fn window(&self) -> (&[f64; WINDOW_LEN], &[f64; WINDOW_LEN]) {
        (&self.window_voltage, &self.window_current)
    }

    pub fn reset(&mut self) {
        self.voltage_history.clear();
        self.current_history.clear();
        self.counters.clear();
        self.window_voltage = [0.0; WINDOW_LEN];
        self.window_current = [0.0; WINDOW_LEN];
        self.latest_voltage = 0.0;
        self.latest_current = 0.0;
    }

    pub fn latest_voltage(&self) -> f64 {
        self.latest_voltage
    }

    pub fn latest_current(&self) -> f64 {
        self.latest_current
    }

    pub fn voltage_history(&self) -> &[f64] {
        &self.voltage_history
    }

    pub fn current_history(&self) -> &[f64] {
        &self.current_history
    }

    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

/// Copy the last `WINDOW_LEN` entries of `history` into `window`, zero-padding on the left.
fn fill_window(window: &mut [f64; WINDOW_LEN], history: &[f64]) {
    let tail = &history[history.len().saturating_sub(WINDOW_LEN)..];
    let pad = WINDOW_LEN - tail.len();
    window[..pad].fill(0.0);
    window[pad..].copy_from_slice(tail);
}

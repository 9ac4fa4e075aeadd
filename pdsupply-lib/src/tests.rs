use crate::buffer::TelemetryBuffer;
use crate::command::{Command, StatusCommand};
use crate::constants::WINDOW_LEN;
use crate::error::{DecodeError, ProtocolError};
use crate::frame::{decode_command, decode_telemetry, encode_command, encode_telemetry};
use crate::telemetry::{OutputStatus, TelemetrySample};

fn sample(counter: u32, voltage: f32, current: f32) -> TelemetrySample {
    TelemetrySample {
        counter,
        status: OutputStatus::Good,
        voltage,
        current,
    }
}

#[test]
fn test_encode_safe_off() {
    let frame = encode_command(&Command::safe_off());
    assert_eq!(hex::encode(frame), "1b000000000000000000000000000000");
}

#[test]
fn test_encode_keep_state_layout() {
    // 5.0 V = 0x40a00000, 500 mA = 0x43fa0000
    let frame = encode_command(&Command::keep_state(5.0, 500.0));
    assert_eq!(hex::encode(frame), "1c000000000000000000a0400000fa43");
}

#[test]
fn test_encode_every_status_and_extreme_values() {
    let statuses = [
        StatusCommand::OutputOn,
        StatusCommand::OutputOff,
        StatusCommand::KeepState,
        StatusCommand::LedOn,
        StatusCommand::LedOff,
    ];
    let values = [0.0f32, -1.5, f32::NAN, f32::MAX];

    for status in statuses {
        for &value in &values {
            let frame = encode_command(&Command::new(status, value, value));
            assert_eq!(frame.len(), 16);
            assert_eq!(u32::from_le_bytes(frame[0..4].try_into().unwrap()), status.code());
            assert_eq!(u32::from_le_bytes(frame[4..8].try_into().unwrap()), 0);
            assert_eq!(u32::from_le_bytes(frame[8..12].try_into().unwrap()), value.to_bits());
            assert_eq!(u32::from_le_bytes(frame[12..16].try_into().unwrap()), value.to_bits());
        }
    }
}

#[test]
fn test_status_command_codes() {
    assert_eq!(StatusCommand::OutputOn.code(), 0x1A);
    assert_eq!(StatusCommand::OutputOff.code(), 0x1B);
    assert_eq!(StatusCommand::KeepState.code(), 0x1C);
    assert_eq!(StatusCommand::LedOn.code(), 0x1D);
    assert_eq!(StatusCommand::LedOff.code(), 0x1E);
}

#[test]
fn test_decode_telemetry_fields() {
    // counter 7, status good, 3.3 V, 120.5 mA
    let mut frame = Vec::new();
    frame.extend_from_slice(&7u32.to_le_bytes());
    frame.extend_from_slice(&0x0Au32.to_le_bytes());
    frame.extend_from_slice(&3.3f32.to_le_bytes());
    frame.extend_from_slice(&120.5f32.to_le_bytes());

    let sample = decode_telemetry(&frame).expect("16-byte frame must decode");
    assert_eq!(sample.counter, 7);
    assert_eq!(sample.status, OutputStatus::Good);
    assert_eq!(sample.voltage, 3.3);
    assert_eq!(sample.current, 120.5);
}

#[test]
fn test_decode_ignores_trailing_notification_bytes() {
    let mut frame = encode_telemetry(&sample(42, 9.0, 250.0)).to_vec();
    frame.resize(64, 0xAA);

    let decoded = decode_telemetry(&frame).unwrap();
    assert_eq!(decoded, sample(42, 9.0, 250.0));
}

#[test]
fn test_decode_too_short() {
    for len in 0..16 {
        let bytes = vec![0x0A; len];
        assert_eq!(
            decode_telemetry(&bytes),
            Err(DecodeError::TooShort {
                expected: 16,
                actual: len
            }),
            "length {len}"
        );
    }
}

#[test]
fn test_decode_unknown_status_passes_through() {
    let mut frame = encode_telemetry(&sample(1, 0.0, 0.0));
    frame[4..8].copy_from_slice(&0u32.to_le_bytes());

    let decoded = decode_telemetry(&frame).unwrap();
    assert_eq!(decoded.status, OutputStatus::Unknown(0x00));
    assert_eq!(decoded.checked_status(), Err(ProtocolError::UnknownStatusCode(0)));
    assert_eq!(decoded.status.label(), "Over Current");
}

#[test]
fn test_output_status_codes() {
    for (code, status) in [
        (0x0A, OutputStatus::Good),
        (0x0B, OutputStatus::Off),
        (0x0C, OutputStatus::Overcurrent),
        (0x0D, OutputStatus::High),
        (0x0E, OutputStatus::Low),
    ] {
        assert_eq!(OutputStatus::from(code), status);
        assert_eq!(status.code(), code);
        assert!(status.is_known());
    }
    assert_eq!(OutputStatus::from(0x0Fu32), OutputStatus::Unknown(0x0F));
    assert_eq!(OutputStatus::default(), OutputStatus::Off);
}

#[test]
fn test_status_labels() {
    assert_eq!(OutputStatus::Good.label(), "Output Enabled");
    assert_eq!(OutputStatus::Off.label(), "Output Off");
    assert_eq!(OutputStatus::Overcurrent.label(), "Over Current");
    assert_eq!(OutputStatus::Low.label(), "Over Current");
}

#[test]
fn test_decode_command_as_firmware() {
    let cmd = Command::new(StatusCommand::OutputOn, 12.0, 1000.0);
    assert_eq!(decode_command(&encode_command(&cmd)), Ok(cmd));

    let mut bad = encode_command(&cmd);
    bad[0] = 0x2F;
    assert_eq!(decode_command(&bad), Err(DecodeError::UnknownCommand(0x2F)));
    assert!(matches!(
        decode_command(&bad[..10]),
        Err(DecodeError::TooShort { expected: 16, actual: 10 })
    ));
}

#[test]
fn test_buffer_latest_and_window_shape() {
    let mut buffer = TelemetryBuffer::default();
    for (counter, voltage) in [(5, 1.0), (6, 2.0), (7, 3.0)] {
        buffer.append(&sample(counter, voltage, voltage * 10.0));
    }

    assert_eq!(buffer.latest_voltage(), 3.0);
    assert_eq!(buffer.latest_current(), 30.0);
    assert_eq!(buffer.counters(), &[5, 6, 7]);
    assert_eq!(buffer.len(), 3);

    let (voltage, current) = buffer.window();
    assert_eq!(voltage.len(), WINDOW_LEN);
    assert_eq!(current.len(), WINDOW_LEN);
    assert_eq!(voltage[0], 0.0);
    assert_eq!(current[0], 0.0);
    assert_eq!(&voltage[97..], &[1.0, 2.0, 3.0]);
    assert!(voltage[..97].iter().all(|v| *v == 0.0));
}

#[test]
fn test_buffer_window_keeps_last_hundred() {
    let mut buffer = TelemetryBuffer::default();
    for i in 1..=150u32 {
        buffer.append(&sample(i, i as f32, 0.0));
    }

    let (voltage, _) = buffer.window();
    // Slot 0 would hold sample 51 but is pinned
    assert_eq!(voltage[0], 0.0);
    assert_eq!(voltage[1], 52.0);
    assert_eq!(voltage[99], 150.0);
    assert_eq!(buffer.voltage_history().len(), 150);
}

#[test]
fn test_buffer_window_unpinned() {
    let mut buffer = TelemetryBuffer::new(false);
    for i in 1..=150u32 {
        buffer.append(&sample(i, i as f32, 0.0));
    }
    let (voltage, _) = buffer.window();
    assert_eq!(voltage[0], 51.0);
}

#[test]
fn test_buffer_reset() {
    let mut buffer = TelemetryBuffer::default();
    for i in 0..10u32 {
        buffer.append(&sample(i, 4.2, 100.0));
    }
    buffer.reset();

    assert!(buffer.is_empty());
    assert_eq!(buffer.latest_voltage(), 0.0);
    assert_eq!(buffer.latest_current(), 0.0);
    let (voltage, current) = buffer.window();
    assert!(voltage.iter().chain(current.iter()).all(|v| *v == 0.0));
}

#[test]
fn test_buffer_widening_is_exact() {
    let mut buffer = TelemetryBuffer::default();
    buffer.append(&sample(0, 3.3, 0.1));
    assert_eq!(buffer.latest_voltage(), 3.3f32 as f64);
    assert_eq!(buffer.latest_current(), 0.1f32 as f64);
}

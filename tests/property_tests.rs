//! Property-based tests using proptest
//!
//! These tests check codec invariants across randomly generated messages:
//! every catalog entry survives build then parse, any single corrupted bit is
//! rejected, and unknown PGNs are preserved rather than dropped.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use agio::core::frame::{checksum, Frame, FrameView};
use agio::protocol::hello::{parse_host_hello, parse_module_hello, HostHello, ModuleHello};
use agio::protocol::message::*;
use agio::protocol::module::ModuleKind;
use proptest::prelude::*;

fn module_kind() -> impl Strategy<Value = ModuleKind> {
    prop_oneof![
        Just(ModuleKind::SteeringActuator),
        Just(ModuleKind::ImplementController),
        Just(ModuleKind::InertialUnit),
    ]
}

fn steering_command() -> impl Strategy<Value = SteeringCommand> {
    (0u16..=u16::MAX, any::<u8>(), any::<i16>(), any::<i16>()).prop_map(
        |(speed, status, angle, xte)| SteeringCommand {
            speed_kmh: f64::from(speed) / 10.0,
            status,
            steer_angle_deg: f64::from(angle) / 100.0,
            cross_track_error_mm: i32::from(xte),
        },
    )
}

fn imu_data() -> impl Strategy<Value = ImuData> {
    (
        any::<i16>(),
        any::<i16>(),
        0u16..=36_000,
        any::<i16>(),
        any::<bool>(),
    )
        .prop_map(|(roll, pitch, heading, yaw, calibrated)| ImuData {
            roll_deg: f64::from(roll) / 100.0,
            pitch_deg: f64::from(pitch) / 100.0,
            heading_deg: f64::from(heading) / 100.0,
            yaw_rate_dps: f64::from(yaw) / 100.0,
            calibrated,
        })
}

fn implement_data() -> impl Strategy<Value = ImplementData> {
    (
        prop::collection::vec(any::<u8>(), RELAY_BANK_LEN),
        prop::collection::vec(any::<u8>(), RELAY_BANK_LEN),
        any::<u8>(),
        prop::collection::vec(any::<u8>(), 0..=238),
    )
        .prop_map(|(relay_lo, relay_hi, tramline, sections)| ImplementData {
            relay_lo,
            relay_hi,
            tramline,
            sections,
        })
}

// Property: steering commands on the fixed-point grid survive build/parse exactly
proptest! {
    #[test]
    fn prop_steering_command_roundtrip(cmd in steering_command()) {
        let bytes = build(&cmd).expect("grid values are representable");
        prop_assert_eq!(bytes.len(), 15);
        prop_assert_eq!(parse_steering_command(&bytes), Some(cmd));
    }
}

// Property: IMU data round trip
proptest! {
    #[test]
    fn prop_imu_data_roundtrip(data in imu_data()) {
        let bytes = build(&data).expect("grid values are representable");
        prop_assert_eq!(parse_imu_data(&bytes), Some(data));
    }
}

// Property: implement data keeps every section byte
proptest! {
    #[test]
    fn prop_implement_data_roundtrip(data in implement_data()) {
        let bytes = build(&data).expect("valid banks");
        prop_assert_eq!(bytes[4] as usize, IMPLEMENT_DATA_FIXED_LEN + data.sections.len());
        prop_assert_eq!(parse_implement_data(&bytes), Some(data));
    }
}

// Property: steering settings with consistent PWM limits round trip
proptest! {
    #[test]
    fn prop_steering_settings_roundtrip(
        gain_p in any::<u8>(),
        low_pwm in any::<u8>(),
        min_pwm in any::<u8>(),
        headroom in any::<u8>(),
        counts_per_degree in 1u8..=u8::MAX,
        was_offset in any::<i16>(),
        ackermann in any::<u8>(),
        max_steer_angle_deg in any::<u8>(),
        invert_was in any::<bool>(),
        invert_motor in any::<bool>(),
    ) {
        let high_pwm = low_pwm.max(min_pwm).saturating_add(headroom);
        let settings = SteeringSettings {
            gain_p,
            high_pwm,
            low_pwm,
            min_pwm,
            counts_per_degree,
            was_offset,
            ackermann,
            max_steer_angle_deg,
            invert_was,
            invert_motor,
        };
        let bytes = build(&settings).expect("consistent settings");
        prop_assert_eq!(parse_steering_settings(&bytes), Some(settings));
    }
}

// Property: steering feedback on the angle grid survives build/parse
proptest! {
    #[test]
    fn prop_steering_feedback_roundtrip(
        angle in any::<i16>(),
        switch_states in any::<u8>(),
        status_flags in any::<u8>(),
    ) {
        let feedback = SteeringFeedback {
            actual_angle_deg: f64::from(angle) / 100.0,
            switch_states,
            status_flags,
        };
        let bytes = build(&feedback).expect("grid values are representable");
        prop_assert_eq!(bytes[2], ModuleKind::SteeringActuator.source());
        prop_assert_eq!(parse_steering_feedback(&bytes), Some(feedback.clone()));
        prop_assert_eq!(parse(&bytes), Some(TypedMessage::SteeringFeedback(feedback)));
    }
}

// Property: implement feedback round trip
proptest! {
    #[test]
    fn prop_implement_feedback_roundtrip(work_switch_active in any::<bool>(), status in any::<u8>()) {
        let feedback = ImplementFeedback { work_switch_active, status };
        let bytes = build(&feedback).unwrap();
        prop_assert_eq!(bytes[2], ModuleKind::ImplementController.source());
        prop_assert_eq!(parse_implement_feedback(&bytes), Some(feedback.clone()));
        prop_assert_eq!(parse(&bytes), Some(TypedMessage::ImplementFeedback(feedback)));
    }
}

// Property: host hellos of any version round trip through the generic parser
proptest! {
    #[test]
    fn prop_host_hello_roundtrip(version in any::<u8>()) {
        let hello = HostHello { version };
        let bytes = build(&hello).unwrap();
        prop_assert_eq!(parse_host_hello(&bytes), Some(hello));
        prop_assert_eq!(parse(&bytes), Some(TypedMessage::HostHello(hello)));
    }
}

// Property: module hellos decode to the module that owns the PGN
proptest! {
    #[test]
    fn prop_module_hello_roundtrip(module in module_kind(), version in any::<u8>()) {
        let hello = ModuleHello { module, version };
        let bytes = build(&hello).unwrap();
        prop_assert_eq!(bytes[2], module.source());
        prop_assert_eq!(parse_module_hello(&bytes), Some(hello));
    }
}

// Property: the CRC byte is the wrapping sum of source through the last payload byte
proptest! {
    #[test]
    fn prop_crc_is_byte_sum(
        source in any::<u8>(),
        pgn in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..=255),
    ) {
        let bytes = Frame::new(source, pgn, payload).unwrap().to_bytes();
        let expected = bytes[2..bytes.len() - 1]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        prop_assert_eq!(*bytes.last().unwrap(), expected);
        prop_assert_eq!(checksum(&bytes[2..bytes.len() - 1]), expected);
    }
}

// Property: flipping any single bit outside the CRC byte is rejected, and the
// untouched frame still decodes afterwards
proptest! {
    #[test]
    fn prop_single_bit_flip_rejected(cmd in steering_command(), bit in 0usize..(14 * 8)) {
        let original = build(&cmd).unwrap();
        let mut corrupted = original.clone();
        corrupted[bit / 8] ^= 1 << (bit % 8);

        prop_assert!(FrameView::parse(&corrupted).is_none());
        prop_assert!(parse(&corrupted).is_none());
        prop_assert_eq!(parse_steering_command(&original), Some(cmd));
    }
}

// Property: any other CRC value is rejected
proptest! {
    #[test]
    fn prop_wrong_crc_rejected(data in imu_data(), crc in any::<u8>()) {
        let original = build(&data).unwrap();
        let last = original.len() - 1;
        prop_assume!(crc != original[last]);

        let mut corrupted = original.clone();
        corrupted[last] = crc;
        prop_assert!(parse(&corrupted).is_none());
        prop_assert!(parse(&original).is_some());
    }
}

// Property: unknown PGNs come back as raw frames with id and payload intact
proptest! {
    #[test]
    fn prop_unknown_pgn_preserved(
        pgn in any::<u8>().prop_filter("catalog PGN", |p| ![254u8, 253, 252, 239, 238, 234, 219, 218, 202, 200, 126, 123, 121].contains(p)),
        payload in prop::collection::vec(any::<u8>(), 0..=255),
    ) {
        let frame = Frame::new(0x70, pgn, payload).unwrap();
        match parse(&frame.to_bytes()) {
            Some(TypedMessage::Raw(raw)) => {
                prop_assert_eq!(raw.pgn, pgn);
                prop_assert_eq!(raw.payload, frame.payload);
            }
            other => prop_assert!(false, "expected raw frame, got {:?}", other),
        }
    }
}

// Property: decoding arbitrary bytes never panics
proptest! {
    #[test]
    fn prop_parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
        let _ = parse(&bytes);
        let _ = Frame::from_bytes(&bytes);
    }
}

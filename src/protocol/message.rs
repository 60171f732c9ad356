//! # Message Catalog
//!
//! Typed payloads for every PGN the host exchanges with its modules, plus the
//! generic `parse` entry point that turns raw wire bytes into a [`TypedMessage`].
//!
//! All multi-byte integers are big-endian. Angles travel as hundredths of a
//! degree, speed as tenths of a km/h, everything else as raw bytes.
//!
//! | PGN | Message            | Payload | Direction     |
//! |-----|--------------------|---------|---------------|
//! | 254 | Steering command   | 9       | host → module |
//! | 253 | Steering feedback  | 8       | module → host |
//! | 252 | Steering settings  | 12      | host → module |
//! | 239 | Implement data     | 17 + N  | host → module |
//! | 238 | Implement config   | 6       | host → module |
//! | 234 | Implement feedback | 2       | module → host |
//! | 219 | IMU data           | 16      | module → host |
//! | 218 | IMU config         | 4       | host → module |
//! | 202 | Scan request       | 2       | host → module |
//! | 200 | Host hello         | 3       | host → module |
//! | 126/123/121 | Module hello | 3     | module → host |
//!
//! Builders validate before encoding and fail with `InvalidArgument`; values are
//! never clamped. Parsers are pure and return `None` on any mismatch.

use serde::{Deserialize, Serialize};

use crate::core::frame::{Frame, FrameView};
use crate::error::{constants, AgioError, Result};
use crate::protocol::hello::{HostHello, ModuleHello, ScanRequest};
use crate::protocol::module::{ModuleKind, HOST_SOURCE};

/// PGN numbers of the catalog
pub mod pgn {
    pub const STEERING_COMMAND: u8 = 254;
    pub const STEERING_FEEDBACK: u8 = 253;
    pub const STEERING_SETTINGS: u8 = 252;
    pub const IMPLEMENT_DATA: u8 = 239;
    pub const IMPLEMENT_CONFIG: u8 = 238;
    pub const IMPLEMENT_FEEDBACK: u8 = 234;
    pub const IMU_DATA: u8 = 219;
    pub const IMU_CONFIG: u8 = 218;
    pub const SCAN_REQUEST: u8 = 202;
    pub const HOST_HELLO: u8 = 200;
}

/// Number of bytes in each implement relay bank
pub const RELAY_BANK_LEN: usize = 8;

/// Fixed part of the implement data payload: two relay banks and the tramline byte
pub const IMPLEMENT_DATA_FIXED_LEN: usize = 2 * RELAY_BANK_LEN + 1;

/// Most sections an implement controller can be configured for
pub const MAX_SECTIONS: u8 = 64;

/// A catalog entry that knows its own wire identity.
///
/// Implementors supply payload encoding and decoding; framing, CRC and
/// header checks come from the provided methods.
pub trait PgnMessage: Sized {
    /// Source byte stamped on frames carrying this message
    fn source(&self) -> u8;

    fn pgn(&self) -> u8;

    /// Validate and append the payload bytes
    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Decode from an already CRC-checked frame; `None` if the PGN or layout does not match
    fn decode(frame: &FrameView<'_>) -> Option<Self>;

    fn build(&self) -> Result<Frame> {
        let mut payload = Vec::with_capacity(16);
        self.encode_payload(&mut payload)?;
        Frame::new(self.source(), self.pgn(), payload)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.build()?.to_bytes())
    }

    fn parse(bytes: &[u8]) -> Option<Self> {
        Self::decode(&FrameView::parse(bytes)?)
    }
}

/// Encode any catalog entry to wire bytes
pub fn build<M: PgnMessage>(message: &M) -> Result<Vec<u8>> {
    message.to_bytes()
}

fn scaled(value: f64, scale: f64, field: &str) -> Result<f64> {
    if !value.is_finite() {
        return Err(AgioError::invalid(format!(
            "{field}: {}",
            constants::ERR_NOT_FINITE
        )));
    }
    Ok((value * scale).round())
}

fn to_u16(value: f64, scale: f64, field: &str) -> Result<u16> {
    let raw = scaled(value, scale, field)?;
    if raw < 0.0 || raw > f64::from(u16::MAX) {
        return Err(AgioError::invalid(format!(
            "{field} {value} does not fit an unsigned 16-bit field at scale {scale}"
        )));
    }
    Ok(raw as u16)
}

fn to_i16(value: f64, scale: f64, field: &str) -> Result<i16> {
    let raw = scaled(value, scale, field)?;
    if raw < f64::from(i16::MIN) || raw > f64::from(i16::MAX) {
        return Err(AgioError::invalid(format!(
            "{field} {value} does not fit a signed 16-bit field at scale {scale}"
        )));
    }
    Ok(raw as i16)
}

fn ensure(condition: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(AgioError::InvalidArgument(msg()))
    }
}

#[inline]
fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn be_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Payload of exactly `len` bytes on the expected PGN, or nothing
#[inline]
fn fixed<'a>(frame: &FrameView<'a>, pgn: u8, len: usize) -> Option<&'a [u8]> {
    (frame.pgn == pgn && frame.payload.len() == len).then_some(frame.payload)
}

/// Guidance output sent to the steering actuator (PGN 254)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringCommand {
    /// Ground speed, 0.1 km/h resolution
    pub speed_kmh: f64,
    pub status: u8,
    /// Target wheel angle, 0.01° resolution
    pub steer_angle_deg: f64,
    /// Lateral distance from the guidance line
    pub cross_track_error_mm: i32,
}

impl PgnMessage for SteeringCommand {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::STEERING_COMMAND
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.speed_kmh < 0.0 {
            return Err(AgioError::invalid(format!(
                "{} (got {})",
                constants::ERR_NEGATIVE_SPEED,
                self.speed_kmh
            )));
        }
        let speed = to_u16(self.speed_kmh, 10.0, "speed")?;
        let angle = to_i16(self.steer_angle_deg, 100.0, "steer angle")?;
        let xte = i16::try_from(self.cross_track_error_mm).map_err(|_| {
            AgioError::invalid(format!(
                "cross-track error {} mm does not fit a signed 16-bit field",
                self.cross_track_error_mm
            ))
        })?;

        out.extend_from_slice(&speed.to_be_bytes());
        out.push(self.status);
        out.extend_from_slice(&angle.to_be_bytes());
        out.extend_from_slice(&xte.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::STEERING_COMMAND, 9)?;
        Some(Self {
            speed_kmh: f64::from(be_u16(p, 0)) / 10.0,
            status: p[2],
            steer_angle_deg: f64::from(be_i16(p, 3)) / 100.0,
            cross_track_error_mm: i32::from(be_i16(p, 5)),
        })
    }
}

/// Steering controller tuning (PGN 252)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SteeringSettings {
    pub gain_p: u8,
    pub high_pwm: u8,
    pub low_pwm: u8,
    pub min_pwm: u8,
    /// Wheel angle sensor counts per degree; must be non-zero
    pub counts_per_degree: u8,
    /// Wheel angle sensor zero offset in raw counts
    pub was_offset: i16,
    pub ackermann: u8,
    pub max_steer_angle_deg: u8,
    pub invert_was: bool,
    pub invert_motor: bool,
}

impl PgnMessage for SteeringSettings {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::STEERING_SETTINGS
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        ensure(self.counts_per_degree > 0, || {
            "counts per degree must be greater than 0".to_string()
        })?;
        ensure(
            self.low_pwm <= self.high_pwm && self.min_pwm <= self.high_pwm,
            || {
                format!(
                    "PWM limits out of order: min {} low {} high {}",
                    self.min_pwm, self.low_pwm, self.high_pwm
                )
            },
        )?;

        out.extend_from_slice(&[
            self.gain_p,
            self.high_pwm,
            self.low_pwm,
            self.min_pwm,
            self.counts_per_degree,
        ]);
        out.extend_from_slice(&self.was_offset.to_be_bytes());
        out.extend_from_slice(&[
            self.ackermann,
            self.max_steer_angle_deg,
            u8::from(self.invert_was),
            u8::from(self.invert_motor),
            0,
        ]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::STEERING_SETTINGS, 12)?;
        Some(Self {
            gain_p: p[0],
            high_pwm: p[1],
            low_pwm: p[2],
            min_pwm: p[3],
            counts_per_degree: p[4],
            was_offset: be_i16(p, 5),
            ackermann: p[7],
            max_steer_angle_deg: p[8],
            invert_was: p[9] != 0,
            invert_motor: p[10] != 0,
        })
    }
}

/// Measured wheel angle and switch state reported by the steering actuator (PGN 253)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringFeedback {
    pub actual_angle_deg: f64,
    pub switch_states: u8,
    pub status_flags: u8,
}

impl PgnMessage for SteeringFeedback {
    fn source(&self) -> u8 {
        ModuleKind::SteeringActuator.source()
    }

    fn pgn(&self) -> u8 {
        pgn::STEERING_FEEDBACK
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        let angle = to_i16(self.actual_angle_deg, 100.0, "actual angle")?;
        out.extend_from_slice(&angle.to_be_bytes());
        out.extend_from_slice(&[self.switch_states, self.status_flags, 0, 0, 0, 0]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::STEERING_FEEDBACK, 8)?;
        Some(Self {
            actual_angle_deg: f64::from(be_i16(p, 0)) / 100.0,
            switch_states: p[2],
            status_flags: p[3],
        })
    }
}

/// Relay and section outputs for the implement controller (PGN 239)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementData {
    /// Exactly [`RELAY_BANK_LEN`] bytes
    pub relay_lo: Vec<u8>,
    /// Exactly [`RELAY_BANK_LEN`] bytes
    pub relay_hi: Vec<u8>,
    pub tramline: u8,
    /// One byte per section; the count is implied by the payload length
    pub sections: Vec<u8>,
}

impl PgnMessage for ImplementData {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::IMPLEMENT_DATA
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        ensure(
            self.relay_lo.len() == RELAY_BANK_LEN && self.relay_hi.len() == RELAY_BANK_LEN,
            || {
                format!(
                    "{} (got {} and {})",
                    constants::ERR_RELAY_BANK_LEN,
                    self.relay_lo.len(),
                    self.relay_hi.len()
                )
            },
        )?;
        let max_sections = u8::MAX as usize - IMPLEMENT_DATA_FIXED_LEN;
        ensure(self.sections.len() <= max_sections, || {
            format!(
                "{} sections exceed the {max_sections} a frame can carry",
                self.sections.len()
            )
        })?;

        out.reserve(IMPLEMENT_DATA_FIXED_LEN + self.sections.len());
        out.extend_from_slice(&self.relay_lo);
        out.extend_from_slice(&self.relay_hi);
        out.push(self.tramline);
        out.extend_from_slice(&self.sections);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        if frame.pgn != pgn::IMPLEMENT_DATA || frame.payload.len() < IMPLEMENT_DATA_FIXED_LEN {
            return None;
        }
        let p = frame.payload;
        Some(Self {
            relay_lo: p[..RELAY_BANK_LEN].to_vec(),
            relay_hi: p[RELAY_BANK_LEN..2 * RELAY_BANK_LEN].to_vec(),
            tramline: p[2 * RELAY_BANK_LEN],
            sections: p[IMPLEMENT_DATA_FIXED_LEN..].to_vec(),
        })
    }
}

/// Implement controller setup (PGN 238)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementConfig {
    /// 1..=[`MAX_SECTIONS`]
    pub section_count: u8,
    /// Hydraulic raise time in seconds
    pub raise_time_s: u8,
    /// Hydraulic lower time in seconds
    pub lower_time_s: u8,
    pub hydraulic_lift: bool,
    pub invert_relays: bool,
    pub work_switch_active_low: bool,
}

impl PgnMessage for ImplementConfig {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::IMPLEMENT_CONFIG
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        ensure(
            (1..=MAX_SECTIONS).contains(&self.section_count),
            || {
                format!(
                    "section count {} outside 1..={MAX_SECTIONS}",
                    self.section_count
                )
            },
        )?;
        out.extend_from_slice(&[
            self.section_count,
            self.raise_time_s,
            self.lower_time_s,
            u8::from(self.hydraulic_lift),
            u8::from(self.invert_relays),
            u8::from(self.work_switch_active_low),
        ]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::IMPLEMENT_CONFIG, 6)?;
        Some(Self {
            section_count: p[0],
            raise_time_s: p[1],
            lower_time_s: p[2],
            hydraulic_lift: p[3] != 0,
            invert_relays: p[4] != 0,
            work_switch_active_low: p[5] != 0,
        })
    }
}

/// Work switch report from the implement controller (PGN 234)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementFeedback {
    pub work_switch_active: bool,
    pub status: u8,
}

impl PgnMessage for ImplementFeedback {
    fn source(&self) -> u8 {
        ModuleKind::ImplementController.source()
    }

    fn pgn(&self) -> u8 {
        pgn::IMPLEMENT_FEEDBACK
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&[u8::from(self.work_switch_active), self.status]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::IMPLEMENT_FEEDBACK, 2)?;
        Some(Self {
            work_switch_active: p[0] != 0,
            status: p[1],
        })
    }
}

/// Inertial unit setup (PGN 218)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuConfig {
    /// Report rate, 1..=100 Hz
    pub update_rate_hz: u8,
    /// Mounting orientation code understood by the unit firmware
    pub orientation: u8,
    /// Heading correction, -180..=180°, 0.01° resolution
    pub heading_offset_deg: f64,
}

impl PgnMessage for ImuConfig {
    fn source(&self) -> u8 {
        HOST_SOURCE
    }

    fn pgn(&self) -> u8 {
        pgn::IMU_CONFIG
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        ensure((1..=100).contains(&self.update_rate_hz), || {
            format!("update rate {} Hz outside 1..=100", self.update_rate_hz)
        })?;
        ensure((-180.0..=180.0).contains(&self.heading_offset_deg), || {
            format!(
                "heading offset {} outside -180..=180 degrees",
                self.heading_offset_deg
            )
        })?;
        let offset = to_i16(self.heading_offset_deg, 100.0, "heading offset")?;
        out.extend_from_slice(&[self.update_rate_hz, self.orientation]);
        out.extend_from_slice(&offset.to_be_bytes());
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::IMU_CONFIG, 4)?;
        Some(Self {
            update_rate_hz: p[0],
            orientation: p[1],
            heading_offset_deg: f64::from(be_i16(p, 2)) / 100.0,
        })
    }
}

/// Attitude sample from the inertial unit (PGN 219)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuData {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    /// 0..=360°
    pub heading_deg: f64,
    pub yaw_rate_dps: f64,
    pub calibrated: bool,
}

impl PgnMessage for ImuData {
    fn source(&self) -> u8 {
        ModuleKind::InertialUnit.source()
    }

    fn pgn(&self) -> u8 {
        pgn::IMU_DATA
    }

    fn encode_payload(&self, out: &mut Vec<u8>) -> Result<()> {
        ensure((0.0..=360.0).contains(&self.heading_deg), || {
            format!("heading {} outside 0..=360 degrees", self.heading_deg)
        })?;
        let roll = to_i16(self.roll_deg, 100.0, "roll")?;
        let pitch = to_i16(self.pitch_deg, 100.0, "pitch")?;
        let heading = to_u16(self.heading_deg, 100.0, "heading")?;
        let yaw_rate = to_i16(self.yaw_rate_dps, 100.0, "yaw rate")?;

        out.extend_from_slice(&roll.to_be_bytes());
        out.extend_from_slice(&pitch.to_be_bytes());
        out.extend_from_slice(&heading.to_be_bytes());
        out.extend_from_slice(&yaw_rate.to_be_bytes());
        out.push(u8::from(self.calibrated));
        out.extend_from_slice(&[0; 7]);
        Ok(())
    }

    fn decode(frame: &FrameView<'_>) -> Option<Self> {
        let p = fixed(frame, pgn::IMU_DATA, 16)?;
        Some(Self {
            roll_deg: f64::from(be_i16(p, 0)) / 100.0,
            pitch_deg: f64::from(be_i16(p, 2)) / 100.0,
            heading_deg: f64::from(be_u16(p, 4)) / 100.0,
            yaw_rate_dps: f64::from(be_i16(p, 6)) / 100.0,
            calibrated: p[8] != 0,
        })
    }
}

/// Any frame the host may see, decoded as far as the catalog allows
#[derive(Debug, Clone, PartialEq)]
pub enum TypedMessage {
    SteeringCommand(SteeringCommand),
    SteeringSettings(SteeringSettings),
    SteeringFeedback(SteeringFeedback),
    ImplementData(ImplementData),
    ImplementConfig(ImplementConfig),
    ImplementFeedback(ImplementFeedback),
    ImuConfig(ImuConfig),
    ImuData(ImuData),
    HostHello(HostHello),
    ScanRequest(ScanRequest),
    ModuleHello(ModuleHello),
    /// Valid frame whose PGN is unknown or whose payload does not fit the catalog layout
    Raw(Frame),
}

impl TypedMessage {
    pub fn pgn(&self) -> u8 {
        match self {
            TypedMessage::SteeringCommand(m) => m.pgn(),
            TypedMessage::SteeringSettings(m) => m.pgn(),
            TypedMessage::SteeringFeedback(m) => m.pgn(),
            TypedMessage::ImplementData(m) => m.pgn(),
            TypedMessage::ImplementConfig(m) => m.pgn(),
            TypedMessage::ImplementFeedback(m) => m.pgn(),
            TypedMessage::ImuConfig(m) => m.pgn(),
            TypedMessage::ImuData(m) => m.pgn(),
            TypedMessage::HostHello(m) => m.pgn(),
            TypedMessage::ScanRequest(m) => m.pgn(),
            TypedMessage::ModuleHello(m) => m.pgn(),
            TypedMessage::Raw(frame) => frame.pgn,
        }
    }

    /// Re-encode into a frame
    pub fn to_frame(&self) -> Result<Frame> {
        match self {
            TypedMessage::SteeringCommand(m) => m.build(),
            TypedMessage::SteeringSettings(m) => m.build(),
            TypedMessage::SteeringFeedback(m) => m.build(),
            TypedMessage::ImplementData(m) => m.build(),
            TypedMessage::ImplementConfig(m) => m.build(),
            TypedMessage::ImplementFeedback(m) => m.build(),
            TypedMessage::ImuConfig(m) => m.build(),
            TypedMessage::ImuData(m) => m.build(),
            TypedMessage::HostHello(m) => m.build(),
            TypedMessage::ScanRequest(m) => m.build(),
            TypedMessage::ModuleHello(m) => m.build(),
            TypedMessage::Raw(frame) => Ok(frame.clone()),
        }
    }
}

/// Decode wire bytes.
///
/// `None` only when the bytes are not a well-formed frame. A valid frame with an
/// unrecognized PGN, or a known PGN with an unexpected layout, comes back as
/// [`TypedMessage::Raw`] so unfamiliar traffic never stalls a consumer.
pub fn parse(bytes: &[u8]) -> Option<TypedMessage> {
    let view = FrameView::parse(bytes)?;
    let typed = match view.pgn {
        pgn::STEERING_COMMAND => SteeringCommand::decode(&view).map(TypedMessage::SteeringCommand),
        pgn::STEERING_SETTINGS => {
            SteeringSettings::decode(&view).map(TypedMessage::SteeringSettings)
        }
        pgn::STEERING_FEEDBACK => {
            SteeringFeedback::decode(&view).map(TypedMessage::SteeringFeedback)
        }
        pgn::IMPLEMENT_DATA => ImplementData::decode(&view).map(TypedMessage::ImplementData),
        pgn::IMPLEMENT_CONFIG => ImplementConfig::decode(&view).map(TypedMessage::ImplementConfig),
        pgn::IMPLEMENT_FEEDBACK => {
            ImplementFeedback::decode(&view).map(TypedMessage::ImplementFeedback)
        }
        pgn::IMU_CONFIG => ImuConfig::decode(&view).map(TypedMessage::ImuConfig),
        pgn::IMU_DATA => ImuData::decode(&view).map(TypedMessage::ImuData),
        pgn::HOST_HELLO => HostHello::decode(&view).map(TypedMessage::HostHello),
        pgn::SCAN_REQUEST => ScanRequest::decode(&view).map(TypedMessage::ScanRequest),
        other if ModuleKind::from_hello_pgn(other).is_some() => {
            ModuleHello::decode(&view).map(TypedMessage::ModuleHello)
        }
        _ => None,
    };

    Some(typed.unwrap_or_else(|| {
        TypedMessage::Raw(Frame {
            source: view.source,
            pgn: view.pgn,
            payload: view.payload.to_vec(),
        })
    }))
}

pub fn parse_steering_command(bytes: &[u8]) -> Option<SteeringCommand> {
    SteeringCommand::parse(bytes)
}

pub fn parse_steering_settings(bytes: &[u8]) -> Option<SteeringSettings> {
    SteeringSettings::parse(bytes)
}

pub fn parse_steering_feedback(bytes: &[u8]) -> Option<SteeringFeedback> {
    SteeringFeedback::parse(bytes)
}

pub fn parse_implement_data(bytes: &[u8]) -> Option<ImplementData> {
    ImplementData::parse(bytes)
}

pub fn parse_implement_config(bytes: &[u8]) -> Option<ImplementConfig> {
    ImplementConfig::parse(bytes)
}

pub fn parse_implement_feedback(bytes: &[u8]) -> Option<ImplementFeedback> {
    ImplementFeedback::parse(bytes)
}

pub fn parse_imu_config(bytes: &[u8]) -> Option<ImuConfig> {
    ImuConfig::parse(bytes)
}

pub fn parse_imu_data(bytes: &[u8]) -> Option<ImuData> {
    ImuData::parse(bytes)
}

//! LMT dual-motor differential platform: motor feedback decoders and the
//! per-motor command encoder.

use dbw_protocol::{Motor, VehicleStatus};

use crate::signal::{be_i16, be_u16, be_u32, clamp, put_be_u16, quantize_u16};
use crate::types::Payload;

// ── IDs ─────────────────────────────────────────────────────────

pub const MOTOR1_COMMAND_ID: u32 = 0x520;
pub const MOTOR2_COMMAND_ID: u32 = 0x521;

pub const MOTOR1_FEEDBACK1_ID: u32 = 0x620;
pub const MOTOR2_FEEDBACK1_ID: u32 = 0x621;
pub const MOTOR1_FEEDBACK2_ID: u32 = 0x622;
pub const MOTOR2_FEEDBACK2_ID: u32 = 0x623;

/// Outbound frames in transmission order.
pub const COMMANDS: [(u32, Motor); 2] = [
    (MOTOR1_COMMAND_ID, Motor::One),
    (MOTOR2_COMMAND_ID, Motor::Two),
];

// ── Limits and scaling ──────────────────────────────────────────

pub const WORK_MODE_IDLE: u8 = 0;
pub const WORK_MODE_CURRENT: u8 = 1;
pub const WORK_MODE_SPEED: u8 = 2;

/// Motor speed limit, rpm.
pub const MAX_SPEED: f64 = 3000.0;
/// Motor current limit, A.
pub const MAX_CURRENT: f64 = 80.0;
pub const SPEED_RESOLUTION: f64 = 0.25;
pub const CURRENT_RESOLUTION: f64 = 0.0078125;

/// Highest rolling counter value before it wraps to 0.
pub const ROLLING_MAX: u8 = 16;

/// Track width used by the differential steering mix.
pub const WHEELBASE: f64 = 1.0;

/// Split a forward speed into per-motor speeds for a steering angle in
/// degrees. Returns `(motor1, motor2)`: motor 1 takes the outer term
/// `s + s·tan(θ)·w/2` for either turn direction.
pub fn differential_speeds(speed: f64, angle_deg: f64, wheelbase: f64) -> (f64, f64) {
    let delta = speed * angle_deg.to_radians().tan() * wheelbase / 2.0;
    (speed + delta, speed - delta)
}

// ── Reports ─────────────────────────────────────────────────────

/// Motor feedback 1 (0x620 / 0x621).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorFeedback1 {
    /// Phase current, A.
    pub current: f64,
    /// Shaft speed, rpm.
    pub speed: f64,
    pub work_mode: u8,
    pub remote_status: u8,
    /// Controller temperature, °C.
    pub temperature: f64,
    pub rolling: u8,
}

impl MotorFeedback1 {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            current: f64::from(be_u16(payload, 0)) * CURRENT_RESOLUTION,
            speed: f64::from(be_i16(payload, 2)) * SPEED_RESOLUTION,
            work_mode: payload[4] & 0x0F,
            remote_status: payload[5] & 0x0F,
            temperature: f64::from(payload[6]),
            rolling: payload[7],
        }
    }
}

/// Motor feedback 2 (0x622 / 0x623).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorFeedback2 {
    /// Accumulated encoder pulses.
    pub pulse_count: u32,
    pub rolling: u8,
}

impl MotorFeedback2 {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            pulse_count: be_u32(payload, 0),
            rolling: payload[4] & 0x0F,
        }
    }
}

/// Inbound LMT frame kinds, tagged with the motor they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Feedback1(Motor),
    Feedback2(Motor),
}

pub const REPORTS: [(u32, ReportKind); 4] = [
    (MOTOR1_FEEDBACK1_ID, ReportKind::Feedback1(Motor::One)),
    (MOTOR2_FEEDBACK1_ID, ReportKind::Feedback1(Motor::Two)),
    (MOTOR1_FEEDBACK2_ID, ReportKind::Feedback2(Motor::One)),
    (MOTOR2_FEEDBACK2_ID, ReportKind::Feedback2(Motor::Two)),
];

impl ReportKind {
    pub fn decode(self, payload: &Payload) -> LmtReport {
        match self {
            ReportKind::Feedback1(motor) => LmtReport::Feedback1 {
                motor,
                feedback: MotorFeedback1::decode(payload),
            },
            ReportKind::Feedback2(motor) => LmtReport::Feedback2 {
                motor,
                feedback: MotorFeedback2::decode(payload),
            },
        }
    }
}

/// A decoded LMT report.
#[derive(Debug, Clone, PartialEq)]
pub enum LmtReport {
    Feedback1 { motor: Motor, feedback: MotorFeedback1 },
    Feedback2 { motor: Motor, feedback: MotorFeedback2 },
}

impl LmtReport {
    pub fn motor(&self) -> Motor {
        match self {
            LmtReport::Feedback1 { motor, .. } | LmtReport::Feedback2 { motor, .. } => *motor,
        }
    }

    /// Write this report into the matching motor's status. Always writes.
    pub fn apply(&self, status: &mut VehicleStatus) -> bool {
        let target = status.motor_mut(self.motor());
        match self {
            LmtReport::Feedback1 { feedback, .. } => {
                target.current = feedback.current;
                target.speed = feedback.speed;
                target.work_mode = feedback.work_mode;
                target.remote_status = feedback.remote_status;
                target.temperature = feedback.temperature;
            }
            LmtReport::Feedback2 { feedback, .. } => {
                target.pulse_count = feedback.pulse_count;
            }
        }
        true
    }
}

// ── Commands ────────────────────────────────────────────────────

/// One motor's command frame (0x520 / 0x521).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorCommand {
    pub work_mode: u8,
    /// Target speed, rpm; clamped to ±3000.
    pub target_speed: f64,
    /// Target current, A; clamped to ±80.
    pub target_current: f64,
    pub rolling: u8,
}

impl MotorCommand {
    pub const SAFE: Self = Self {
        work_mode: WORK_MODE_IDLE,
        target_speed: 0.0,
        target_current: 0.0,
        rolling: 0,
    };

    /// The same command for a mirror-mounted motor: speed and current flip sign.
    pub fn mirrored(self) -> Self {
        Self {
            target_speed: -self.target_speed,
            target_current: -self.target_current,
            ..self
        }
    }

    pub fn encode(&self) -> Payload {
        let speed = clamp(self.target_speed, -MAX_SPEED, MAX_SPEED);
        let current = clamp(self.target_current, -MAX_CURRENT, MAX_CURRENT);

        let mut p = [0u8; 8];
        p[0] = self.work_mode & 0x0F;
        put_be_u16(&mut p, 3, quantize_u16(speed, SPEED_RESOLUTION));
        put_be_u16(&mut p, 5, quantize_u16(current, CURRENT_RESOLUTION));
        p[7] = self.rolling;
        p
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transmission gear as reported by (and commanded to) the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gear {
    Unknown,
    #[default]
    P,
    R,
    N,
    D,
}

impl Gear {
    /// Map a 3-bit gear code to a gear. Unmapped codes yield `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code & 0x07 {
            1 => Gear::P,
            2 => Gear::R,
            3 => Gear::N,
            4 => Gear::D,
            _ => Gear::Unknown,
        }
    }

    /// Wire code for this gear (`Unknown` encodes as 0).
    pub fn code(self) -> u8 {
        match self {
            Gear::Unknown => 0,
            Gear::P => 1,
            Gear::R => 2,
            Gear::N => 3,
            Gear::D => 4,
        }
    }
}

/// Chassis driving mode from the VCU report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrivingMode {
    #[default]
    Manual,
    Auto,
    Emergency,
    Standby,
}

impl DrivingMode {
    /// Map the 2-bit vehicle-mode state.
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => DrivingMode::Manual,
            1 => DrivingMode::Auto,
            2 => DrivingMode::Emergency,
            _ => DrivingMode::Standby,
        }
    }
}

/// Turn indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnLight {
    #[default]
    None,
    Left,
    Right,
    Hazard,
}

impl TurnLight {
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => TurnLight::None,
            1 => TurnLight::Left,
            2 => TurnLight::Right,
            _ => TurnLight::Hazard,
        }
    }
}

/// One of the two drive motors on the differential platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motor {
    One,
    Two,
}

/// Per-motor feedback on the dual-motor platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorStatus {
    /// Phase current in amps.
    pub current: f64,
    /// Shaft speed in rpm.
    pub speed: f64,
    pub work_mode: u8,
    /// Remote/leg status nibble.
    pub remote_status: u8,
    /// Temperature in °C.
    pub temperature: f64,
    /// Accumulated pulse (circle) count.
    pub pulse_count: u32,
}

/// Live snapshot of decoded telemetry, overwritten in place as frames arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    /// Vehicle speed in km/h.
    pub speed: f64,
    /// Throttle pedal, percent.
    pub throttle: f64,
    /// Brake pedal, percent.
    pub brake: f64,
    /// Steering, percent of full lock (-100..=100).
    pub steering: f64,
    pub turn_light: TurnLight,
    pub driving_mode: DrivingMode,
    pub gear: Gear,
    pub parking_brake: bool,
    /// Battery state of charge, percent.
    pub battery: u8,
    pub motor1: MotorStatus,
    pub motor2: MotorStatus,
    /// Time of the last decoded update; `None` until the first one.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self {
            speed: 0.0,
            throttle: 0.0,
            brake: 0.0,
            steering: 0.0,
            turn_light: TurnLight::None,
            driving_mode: DrivingMode::Manual,
            gear: Gear::P,
            parking_brake: false,
            battery: 100,
            motor1: MotorStatus::default(),
            motor2: MotorStatus::default(),
            updated_at: None,
        }
    }
}

impl VehicleStatus {
    pub fn motor(&self, motor: Motor) -> &MotorStatus {
        match motor {
            Motor::One => &self.motor1,
            Motor::Two => &self.motor2,
        }
    }

    pub fn motor_mut(&mut self, motor: Motor) -> &mut MotorStatus {
        match motor {
            Motor::One => &mut self.motor1,
            Motor::Two => &mut self.motor2,
        }
    }

    /// Record that a field was just updated.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    /// True when nothing has been decoded for longer than `max_age`
    /// (or nothing has been decoded at all).
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.updated_at {
            None => true,
            Some(at) => now
                .signed_duration_since(at)
                .to_std()
                .map(|age| age > max_age)
                .unwrap_or(false),
        }
    }
}

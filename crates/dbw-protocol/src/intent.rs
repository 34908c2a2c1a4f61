use serde::{Deserialize, Serialize};

use crate::protocol::Protocol;
use crate::status::Gear;

/// Operator set-points for the Hooke2 chassis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hooke2Intent {
    /// Autonomous driving enabled. When false every command is reset.
    pub auto_drive: bool,
    /// Throttle pedal, percent.
    pub throttle: f64,
    /// Brake pedal, percent.
    pub brake: f64,
    /// Steering, percent of full lock (-100..=100).
    pub steering: f64,
    pub gear: Gear,
    /// Engage the parking brake.
    pub park: bool,
}

impl Default for Hooke2Intent {
    fn default() -> Self {
        Self {
            auto_drive: false,
            throttle: 0.0,
            brake: 0.0,
            steering: 0.0,
            gear: Gear::N,
            park: false,
        }
    }
}

impl Hooke2Intent {
    /// Build an intent from the operator controls. Selecting `P` requests
    /// the parking brake.
    pub fn from_controls(auto_drive: bool, throttle: f64, brake: f64, steering: f64, gear: Gear) -> Self {
        Self {
            auto_drive,
            throttle,
            brake,
            steering,
            gear,
            park: gear == Gear::P,
        }
    }
}

/// Motor control mode on the dual-motor platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorMode {
    #[default]
    Idle,
    /// Closed-loop speed with differential steering.
    Speed,
    /// Open-loop current (torque).
    Current,
}

/// Operator set-points for the LMT platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmtIntent {
    pub mode: MotorMode,
    /// Forward speed in rpm.
    pub target_speed: f64,
    /// Steering angle in degrees; positive turns right.
    pub target_angle: f64,
    /// Motor current in amps.
    pub target_current: f64,
}

/// Protocol-specific desired actuator state, sampled once per control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum CommandIntent {
    Hooke2(Hooke2Intent),
    Lmt(LmtIntent),
}

impl CommandIntent {
    /// The disengaged intent for `protocol`.
    pub fn idle(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Hooke2 => CommandIntent::Hooke2(Hooke2Intent::default()),
            Protocol::Lmt => CommandIntent::Lmt(LmtIntent::default()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            CommandIntent::Hooke2(_) => Protocol::Hooke2,
            CommandIntent::Lmt(_) => Protocol::Lmt,
        }
    }

    /// Whether the intent is not actively commanding the vehicle, in which
    /// case every outbound field must be forced to its safe default.
    pub fn requires_safe_reset(&self) -> bool {
        match self {
            CommandIntent::Hooke2(intent) => !intent.auto_drive,
            CommandIntent::Lmt(intent) => intent.mode == MotorMode::Idle,
        }
    }
}

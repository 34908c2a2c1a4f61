//! Hooke2 drive-by-wire chassis: report decoders and command encoders.
//!
//! Reports arrive on 0x500–0x516, commands go out on 0x100–0x105. Every
//! multi-byte field is big-endian. Checksum bytes are written as zero; the
//! chassis does not verify them.

use dbw_protocol::{DrivingMode, Gear, TurnLight, VehicleStatus};

use crate::signal::{be_i16, be_u16, clamp, put_be_u16, quantize, quantize_u16, sign_extend};
use crate::types::Payload;

// ── Report IDs ──────────────────────────────────────────────────

pub const THROTTLE_REPORT_ID: u32 = 0x500;
pub const BRAKE_REPORT_ID: u32 = 0x501;
pub const STEERING_REPORT_ID: u32 = 0x502;
pub const GEAR_REPORT_ID: u32 = 0x503;
pub const PARK_REPORT_ID: u32 = 0x504;
pub const VCU_REPORT_ID: u32 = 0x505;
pub const WHEEL_SPEED_REPORT_ID: u32 = 0x506;
pub const BMS_REPORT_ID: u32 = 0x512;

// ── Command IDs ─────────────────────────────────────────────────

pub const THROTTLE_COMMAND_ID: u32 = 0x100;
pub const BRAKE_COMMAND_ID: u32 = 0x101;
pub const STEERING_COMMAND_ID: u32 = 0x102;
pub const GEAR_COMMAND_ID: u32 = 0x103;
pub const PARK_COMMAND_ID: u32 = 0x104;
pub const VEHICLE_MODE_COMMAND_ID: u32 = 0x105;

/// Encoder selected for one outbound identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Throttle,
    Brake,
    Steering,
    Gear,
    Park,
    VehicleMode,
}

/// Outbound frames in transmission order.
pub const COMMANDS: [(u32, CommandKind); 6] = [
    (THROTTLE_COMMAND_ID, CommandKind::Throttle),
    (BRAKE_COMMAND_ID, CommandKind::Brake),
    (STEERING_COMMAND_ID, CommandKind::Steering),
    (GEAR_COMMAND_ID, CommandKind::Gear),
    (PARK_COMMAND_ID, CommandKind::Park),
    (VEHICLE_MODE_COMMAND_ID, CommandKind::VehicleMode),
];

// ── Scaling ─────────────────────────────────────────────────────

/// Pedal percent per bit.
pub const PEDAL_RESOLUTION: f64 = 0.1;
/// Steering wheel travel either side of center, degrees.
pub const MAX_STEER_ANGLE: f64 = 500.0;
/// Commanded steering rate, degrees per second.
pub const STEER_ANGLE_SPEED: u8 = 250;
/// Fixed brake deceleration request, m/s².
pub const BRAKE_DECELERATION: f64 = 0.25;
const ACCEL_RESOLUTION: f64 = 0.01;
const SPEED_RESOLUTION: f64 = 0.001;
const ULTRASONIC_RESOLUTION: f64 = 0.01724;
const MPS_TO_KMH: f64 = 3.6;

// ── Reports ─────────────────────────────────────────────────────

/// Throttle (0x500) or brake (0x501) pedal feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedalReport {
    /// Actual pedal position, percent.
    pub pedal: f64,
    /// 0 manual, 1 auto, 2 takeover, 3 standby.
    pub enable_state: u8,
    pub fault1: u8,
    pub fault2: u8,
}

impl PedalReport {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            pedal: f64::from(be_u16(payload, 3)) * PEDAL_RESOLUTION,
            enable_state: payload[0] & 0x03,
            fault1: payload[1],
            fault2: payload[2],
        }
    }
}

/// Steering feedback (0x502).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringReport {
    /// Steering wheel angle in degrees, positive right.
    pub angle: f64,
    pub angle_speed: u8,
    pub enable_state: u8,
    pub fault1: u8,
    pub fault2: u8,
}

impl SteeringReport {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            angle: f64::from(be_u16(payload, 3)) - MAX_STEER_ANGLE,
            angle_speed: payload[7],
            enable_state: payload[0] & 0x03,
            fault1: payload[1],
            fault2: payload[2],
        }
    }

    /// Angle as percent of full lock, bounded to ±100.
    pub fn percent(&self) -> f64 {
        clamp(self.angle / 5.0, -100.0, 100.0)
    }
}

/// Gear feedback (0x503).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearReport {
    pub gear: Gear,
    pub fault: u8,
}

impl GearReport {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            gear: Gear::from_code(payload[0] & 0x07),
            fault: payload[1],
        }
    }
}

/// Parking brake feedback (0x504).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkReport {
    pub engaged: bool,
    pub fault: u8,
}

impl ParkReport {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            engaged: payload[0] & 0x01 != 0,
            fault: payload[1],
        }
    }
}

/// Vehicle control unit summary (0x505).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VcuReport {
    /// Longitudinal acceleration, m/s², within ±10.
    pub acceleration: f64,
    /// Vehicle speed, m/s.
    pub speed: f64,
    pub brake_light: bool,
    pub turn_light: TurnLight,
    pub chassis_error: u8,
    pub drive_mode: u8,
    pub steer_mode: u8,
    pub vehicle_mode: DrivingMode,
    pub aeb_active: bool,
    pub front_crash: bool,
    pub back_crash: bool,
}

impl VcuReport {
    pub fn decode(payload: &Payload) -> Self {
        // 12-bit acceleration spans byte 0 and the high nibble of byte 1.
        let raw_accel = (u32::from(payload[0]) << 4) | u32::from(payload[1] >> 4);
        let acceleration = f64::from(sign_extend(raw_accel, 12)) * ACCEL_RESOLUTION;
        let speed = f64::from(be_i16(payload, 2)) * SPEED_RESOLUTION;

        Self {
            acceleration: clamp(acceleration, -10.0, 10.0),
            speed: clamp(speed, -32.768, 32.767),
            brake_light: (payload[1] >> 3) & 0x01 != 0,
            turn_light: TurnLight::from_code(payload[7] & 0x03),
            chassis_error: payload[5],
            drive_mode: (payload[4] >> 5) & 0x07,
            steer_mode: payload[1] & 0x07,
            vehicle_mode: DrivingMode::from_code((payload[4] >> 3) & 0x03),
            aeb_active: payload[4] & 0x01 != 0,
            front_crash: (payload[4] >> 1) & 0x01 != 0,
            back_crash: (payload[4] >> 2) & 0x01 != 0,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed * MPS_TO_KMH
    }
}

/// Per-wheel speeds in m/s (0x506).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelSpeedReport {
    pub front_left: f64,
    pub front_right: f64,
    pub rear_left: f64,
    pub rear_right: f64,
}

impl WheelSpeedReport {
    pub fn decode(payload: &Payload) -> Self {
        let wheel = |at| f64::from(be_u16(payload, at)) * SPEED_RESOLUTION;
        Self {
            front_left: wheel(0),
            front_right: wheel(2),
            rear_left: wheel(4),
            rear_right: wheel(6),
        }
    }
}

/// Four ultrasonic time-of-flight distances, in cm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UltrasonicReport {
    /// Sensor numbers, in payload order.
    pub sensors: [u8; 4],
    /// Indirect (cross-echo) rather than direct readings.
    pub indirect: bool,
    pub distances: [f64; 4],
}

impl UltrasonicReport {
    pub fn decode(payload: &Payload, sensors: [u8; 4], indirect: bool) -> Self {
        let mut distances = [0.0; 4];
        for (i, d) in distances.iter_mut().enumerate() {
            *d = f64::from(be_u16(payload, i * 2)) * ULTRASONIC_RESOLUTION;
        }
        Self {
            sensors,
            indirect,
            distances,
        }
    }
}

/// Battery management summary (0x512).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmsReport {
    /// Pack voltage, V.
    pub voltage: f64,
    /// Pack current, A (negative while charging).
    pub current: f64,
    /// State of charge, percent.
    pub soc: u8,
}

impl BmsReport {
    pub fn decode(payload: &Payload) -> Self {
        Self {
            voltage: f64::from(be_u16(payload, 0)) * 0.01,
            current: f64::from(be_u16(payload, 2)) * 0.1 - 3200.0,
            soc: payload[4].min(100),
        }
    }
}

/// One fragment of the 17-character VIN (0x514–0x516).
#[derive(Debug, Clone, PartialEq)]
pub struct VinReport {
    /// Index of the first VIN character carried.
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl VinReport {
    pub fn decode(payload: &Payload, fragment: u8) -> Self {
        let offset = usize::from(fragment) * 8;
        let len = if fragment == 2 { 1 } else { 8 };
        Self {
            offset,
            bytes: payload[..len].to_vec(),
        }
    }
}

/// Inbound Hooke2 frame kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Throttle,
    Brake,
    Steering,
    Gear,
    Park,
    Vcu,
    WheelSpeed,
    Ultrasonic { sensors: [u8; 4], indirect: bool },
    Bms,
    Vin { fragment: u8 },
}

/// Identifier → report kind for every frame the chassis publishes.
pub const REPORTS: [(u32, ReportKind); 16] = [
    (THROTTLE_REPORT_ID, ReportKind::Throttle),
    (BRAKE_REPORT_ID, ReportKind::Brake),
    (STEERING_REPORT_ID, ReportKind::Steering),
    (GEAR_REPORT_ID, ReportKind::Gear),
    (PARK_REPORT_ID, ReportKind::Park),
    (VCU_REPORT_ID, ReportKind::Vcu),
    (WHEEL_SPEED_REPORT_ID, ReportKind::WheelSpeed),
    (0x507, ReportKind::Ultrasonic { sensors: [8, 9, 10, 11], indirect: false }),
    (0x508, ReportKind::Ultrasonic { sensors: [8, 9, 10, 11], indirect: true }),
    (0x509, ReportKind::Ultrasonic { sensors: [2, 3, 4, 5], indirect: false }),
    (0x510, ReportKind::Ultrasonic { sensors: [2, 3, 4, 5], indirect: true }),
    (0x511, ReportKind::Ultrasonic { sensors: [0, 1, 6, 7], indirect: false }),
    (BMS_REPORT_ID, ReportKind::Bms),
    (0x514, ReportKind::Vin { fragment: 0 }),
    (0x515, ReportKind::Vin { fragment: 1 }),
    (0x516, ReportKind::Vin { fragment: 2 }),
];

impl ReportKind {
    pub fn decode(self, payload: &Payload) -> Hooke2Report {
        match self {
            ReportKind::Throttle => Hooke2Report::Throttle(PedalReport::decode(payload)),
            ReportKind::Brake => Hooke2Report::Brake(PedalReport::decode(payload)),
            ReportKind::Steering => Hooke2Report::Steering(SteeringReport::decode(payload)),
            ReportKind::Gear => Hooke2Report::Gear(GearReport::decode(payload)),
            ReportKind::Park => Hooke2Report::Park(ParkReport::decode(payload)),
            ReportKind::Vcu => Hooke2Report::Vcu(VcuReport::decode(payload)),
            ReportKind::WheelSpeed => Hooke2Report::WheelSpeed(WheelSpeedReport::decode(payload)),
            ReportKind::Ultrasonic { sensors, indirect } => {
                Hooke2Report::Ultrasonic(UltrasonicReport::decode(payload, sensors, indirect))
            }
            ReportKind::Bms => Hooke2Report::Bms(BmsReport::decode(payload)),
            ReportKind::Vin { fragment } => Hooke2Report::Vin(VinReport::decode(payload, fragment)),
        }
    }
}

/// A decoded Hooke2 report.
#[derive(Debug, Clone, PartialEq)]
pub enum Hooke2Report {
    Throttle(PedalReport),
    Brake(PedalReport),
    Steering(SteeringReport),
    Gear(GearReport),
    Park(ParkReport),
    Vcu(VcuReport),
    WheelSpeed(WheelSpeedReport),
    Ultrasonic(UltrasonicReport),
    Bms(BmsReport),
    Vin(VinReport),
}

impl Hooke2Report {
    /// Write this report's signals into `status`. Returns whether any
    /// status field was written.
    pub fn apply(&self, status: &mut VehicleStatus) -> bool {
        match self {
            Hooke2Report::Throttle(r) => status.throttle = r.pedal,
            Hooke2Report::Brake(r) => status.brake = r.pedal,
            Hooke2Report::Steering(r) => status.steering = r.percent(),
            Hooke2Report::Gear(r) => status.gear = r.gear,
            Hooke2Report::Park(r) => status.parking_brake = r.engaged,
            Hooke2Report::Vcu(r) => {
                status.speed = r.speed_kmh();
                status.turn_light = r.turn_light;
                status.driving_mode = r.vehicle_mode;
            }
            Hooke2Report::Bms(r) => status.battery = r.soc,
            Hooke2Report::WheelSpeed(_) | Hooke2Report::Ultrasonic(_) | Hooke2Report::Vin(_) => {
                return false;
            }
        }
        true
    }
}

// ── Commands ────────────────────────────────────────────────────

/// Split a 10-bit raw value across a low byte and the low two bits of the next.
fn put_split_u10(payload: &mut Payload, lo: usize, hi: usize, raw: u16) {
    payload[lo] = (raw & 0xFF) as u8;
    payload[hi] = ((raw >> 8) & 0x03) as u8;
}

/// Throttle pedal command (0x100).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleCommand {
    pub enable: bool,
    /// Pedal target, percent; clamped to [0, 100].
    pub pedal: f64,
}

impl ThrottleCommand {
    pub const SAFE: Self = Self {
        enable: false,
        pedal: 0.0,
    };

    pub fn encode(&self) -> Payload {
        let mut p = [0u8; 8];
        p[0] = u8::from(self.enable);
        // Acceleration (bytes 1–2) and velocity (bytes 5–6) targets stay zero.
        put_be_u16(&mut p, 3, quantize_u16(clamp(self.pedal, 0.0, 100.0), PEDAL_RESOLUTION));
        p
    }
}

/// Brake pedal command (0x101).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrakeCommand {
    pub enable: bool,
    /// Pedal target, percent; clamped to [0, 100].
    pub pedal: f64,
}

impl BrakeCommand {
    pub const SAFE: Self = Self {
        enable: false,
        pedal: 0.0,
    };

    pub fn encode(&self) -> Payload {
        let aeb_enable = 0u8;
        let mut p = [0u8; 8];
        p[0] = (aeb_enable << 1) | u8::from(self.enable);
        put_split_u10(&mut p, 1, 2, quantize(BRAKE_DECELERATION, ACCEL_RESOLUTION) as u16);
        put_be_u16(&mut p, 3, quantize_u16(clamp(self.pedal, 0.0, 100.0), PEDAL_RESOLUTION));
        p
    }
}

/// Steering angle command (0x102).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringCommand {
    pub enable: bool,
    /// Steering target, percent of full lock.
    pub percent: f64,
}

impl SteeringCommand {
    pub const SAFE: Self = Self {
        enable: false,
        percent: 0.0,
    };

    pub fn encode(&self) -> Payload {
        let angle = clamp(
            self.percent / 100.0 * MAX_STEER_ANGLE,
            -MAX_STEER_ANGLE,
            MAX_STEER_ANGLE,
        );
        let mut p = [0u8; 8];
        p[0] = u8::from(self.enable);
        p[1] = STEER_ANGLE_SPEED;
        put_be_u16(&mut p, 3, quantize_u16(angle + MAX_STEER_ANGLE, 1.0));
        p
    }
}

/// Gear selection command (0x103).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearCommand {
    pub enable: bool,
    /// Raw gear code; only the low 3 bits are sent.
    pub code: u8,
}

impl GearCommand {
    pub const SAFE: Self = Self {
        enable: false,
        code: 0,
    };

    pub fn new(enable: bool, gear: Gear) -> Self {
        Self {
            enable,
            code: gear.code(),
        }
    }

    pub fn encode(&self) -> Payload {
        let mut p = [0u8; 8];
        p[0] = u8::from(self.enable);
        p[1] = self.code & 0x07;
        p
    }
}

/// Parking brake command (0x104).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkCommand {
    pub enable: bool,
    /// `true` triggers the parking brake, `false` releases it.
    pub park: bool,
}

impl ParkCommand {
    pub const SAFE: Self = Self {
        enable: false,
        park: false,
    };

    pub fn encode(&self) -> Payload {
        let mut p = [0u8; 8];
        p[0] = u8::from(self.enable);
        p[1] = u8::from(self.park);
        p
    }
}

/// Vehicle mode command (0x105).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VehicleModeCommand {
    pub turn_light: u8,
    pub vin_request: bool,
    pub drive_mode: u8,
    pub steer_mode: u8,
}

impl VehicleModeCommand {
    pub const SAFE: Self = Self {
        turn_light: 0,
        vin_request: false,
        drive_mode: 0,
        steer_mode: 0,
    };

    /// The chassis only ever receives the zeroed defaults on 0x105; the
    /// requested fields are not packed.
    pub fn encode(&self) -> Payload {
        let mode = Self::SAFE;
        let mut p = [0u8; 8];
        p[0] = mode.steer_mode & 0x07;
        p[1] = (mode.drive_mode & 0x07) << 5;
        p[2] = (mode.turn_light & 0x03) << 6;
        p[3] = u8::from(mode.vin_request) << 7;
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind_for(id: u32) -> ReportKind {
        REPORTS.iter().find(|(rid, _)| *rid == id).unwrap().1
    }

    #[test]
    fn throttle_scenario() {
        let p = ThrottleCommand { enable: true, pedal: 50.0 }.encode();
        assert_eq!(p[0] & 0x01, 1);
        assert_eq!(p[3], 0x01);
        assert_eq!(p[4], 0xF4);
        assert_eq!(p[7], 0); // checksum
    }

    #[test]
    fn throttle_leaves_unused_targets_zero() {
        let p = ThrottleCommand { enable: true, pedal: 100.0 }.encode();
        assert_eq!([p[1], p[2], p[5], p[6]], [0; 4]);
    }

    #[test]
    fn command_table_order() {
        let ids: Vec<u32> = COMMANDS.iter().map(|&(id, _)| id).collect();
        assert_eq!(ids, vec![0x100, 0x101, 0x102, 0x103, 0x104, 0x105]);
        assert_eq!(COMMANDS[5].1, CommandKind::VehicleMode);
    }

    #[test]
    fn throttle_clamps_pedal() {
        let p = ThrottleCommand { enable: true, pedal: 140.0 }.encode();
        assert_eq!(be_u16(&p, 3), 1000);
        let p = ThrottleCommand { enable: true, pedal: -3.0 }.encode();
        assert_eq!(be_u16(&p, 3), 0);
    }

    #[test]
    fn brake_layout() {
        let p = BrakeCommand { enable: true, pedal: 12.5 }.encode();
        assert_eq!(p[0], 0x01);
        assert_eq!(p[1], 25); // 0.25 m/s² at 0.01
        assert_eq!(p[2], 0);
        assert_eq!(be_u16(&p, 3), 125);
        assert_eq!(p[7], 0);
    }

    #[test]
    fn steering_layout() {
        let p = SteeringCommand { enable: true, percent: 0.0 }.encode();
        assert_eq!(p[0], 1);
        assert_eq!(p[1], 250);
        assert_eq!(be_u16(&p, 3), 500);

        let p = SteeringCommand { enable: true, percent: -100.0 }.encode();
        assert_eq!(be_u16(&p, 3), 0);

        // Beyond full lock clamps to ±500 degrees.
        let p = SteeringCommand { enable: true, percent: 250.0 }.encode();
        assert_eq!(be_u16(&p, 3), 1000);
    }

    #[test]
    fn gear_layout() {
        let p = GearCommand::new(true, Gear::D).encode();
        assert_eq!(p[0], 1);
        assert_eq!(p[1], 4);
        let p = GearCommand { enable: true, code: 0x0F }.encode();
        assert_eq!(p[1], 0x07);
    }

    #[test]
    fn park_layout() {
        let p = ParkCommand { enable: true, park: true }.encode();
        assert_eq!(&p[..2], &[1, 1]);
        let p = ParkCommand { enable: true, park: false }.encode();
        assert_eq!(&p[..2], &[1, 0]);
    }

    #[test]
    fn vehicle_mode_ignores_request() {
        let requested = VehicleModeCommand {
            turn_light: 3,
            vin_request: true,
            drive_mode: 1,
            steer_mode: 2,
        };
        assert_eq!(requested.encode(), [0u8; 8]);
    }

    #[test]
    fn safe_commands_are_zero() {
        assert_eq!(ThrottleCommand::SAFE.encode(), [0u8; 8]);
        assert_eq!(GearCommand::SAFE.encode(), [0u8; 8]);
        assert_eq!(ParkCommand::SAFE.encode(), [0u8; 8]);
        let steer = SteeringCommand::SAFE.encode();
        assert_eq!(steer[0], 0);
        assert_eq!(be_u16(&steer, 3), 500); // centered
        let brake = BrakeCommand::SAFE.encode();
        assert_eq!(brake[0], 0);
        assert_eq!(be_u16(&brake, 3), 0);
    }

    #[test]
    fn decode_pedal_report() {
        let p = [0x01, 0x02, 0x03, 0x01, 0xF4, 0, 0, 0];
        let r = PedalReport::decode(&p);
        assert!((r.pedal - 50.0).abs() < 1e-9);
        assert_eq!(r.enable_state, 1);
        assert_eq!(r.fault1, 2);
        assert_eq!(r.fault2, 3);
    }

    #[test]
    fn decode_steering_report() {
        // raw 750 → +250°, 50 %
        let p = [0x01, 0, 0, 0x02, 0xEE, 0, 0, 0xFA];
        let r = SteeringReport::decode(&p);
        assert_eq!(r.angle, 250.0);
        assert_eq!(r.percent(), 50.0);
        assert_eq!(r.angle_speed, 250);

        // raw 0 → -500°, clamped at -100 %
        let r = SteeringReport::decode(&[0; 8]);
        assert_eq!(r.percent(), -100.0);
    }

    #[test]
    fn decode_gear_unmapped_is_unknown() {
        assert_eq!(GearReport::decode(&[0x04, 0, 0, 0, 0, 0, 0, 0]).gear, Gear::D);
        assert_eq!(GearReport::decode(&[0x06, 0, 0, 0, 0, 0, 0, 0]).gear, Gear::Unknown);
        // Only the low three bits carry the gear.
        assert_eq!(GearReport::decode(&[0xF9, 0, 0, 0, 0, 0, 0, 0]).gear, Gear::P);
    }

    #[test]
    fn decode_vcu_negative_fields() {
        // accel raw 0xFF6 (-10 → -0.10 m/s²), speed -1000 (-1.0 m/s)
        let speed = (-1000i16).to_be_bytes();
        let p = [0xFF, 0x60 | 0x08 | 0x02, speed[0], speed[1], (1 << 3) | 0x01, 0x07, 0, 0x02];
        let r = VcuReport::decode(&p);
        assert!((r.acceleration + 0.10).abs() < 1e-9);
        assert!((r.speed + 1.0).abs() < 1e-9);
        assert!((r.speed_kmh() + 3.6).abs() < 1e-9);
        assert!(r.brake_light);
        assert_eq!(r.steer_mode, 2);
        assert_eq!(r.vehicle_mode, DrivingMode::Auto);
        assert!(r.aeb_active);
        assert_eq!(r.chassis_error, 7);
        assert_eq!(r.turn_light, TurnLight::Right);
    }

    #[test]
    fn decode_vcu_positive_accel() {
        // raw 0x3E8 = 1000 → 10.0 m/s²
        let p = [0x3E, 0x80, 0, 0, 0, 0, 0, 0];
        let r = VcuReport::decode(&p);
        assert!((r.acceleration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn decode_bms() {
        // 48.00 V, raw current 32100 → 10.0 A, SOC 250 clamped
        let v = 4800u16.to_be_bytes();
        let c = 32100u16.to_be_bytes();
        let r = BmsReport::decode(&[v[0], v[1], c[0], c[1], 250, 0, 0, 0]);
        assert!((r.voltage - 48.0).abs() < 1e-9);
        assert!((r.current - 10.0).abs() < 1e-6);
        assert_eq!(r.soc, 100);
    }

    #[test]
    fn decode_ultrasonic_and_wheels() {
        let p = [0x00, 0x64, 0, 0, 0, 0, 0x03, 0xE8];
        let r = UltrasonicReport::decode(&p, [8, 9, 10, 11], false);
        assert!((r.distances[0] - 1.724).abs() < 1e-9);
        assert!((r.distances[3] - 17.24).abs() < 1e-9);

        let w = WheelSpeedReport::decode(&p);
        assert!((w.front_left - 0.1).abs() < 1e-9);
        assert!((w.rear_right - 1.0).abs() < 1e-9);
    }

    #[test]
    fn vin_fragments() {
        let p = *b"LSJA24U6";
        let r = VinReport::decode(&p, 0);
        assert_eq!(r.offset, 0);
        assert_eq!(r.bytes, b"LSJA24U6".to_vec());
        let r = VinReport::decode(&p, 2);
        assert_eq!(r.offset, 16);
        assert_eq!(r.bytes, vec![b'L']);
    }

    #[test]
    fn report_table_is_complete() {
        assert_eq!(REPORTS.len(), 16);
        assert_eq!(kind_for(0x510), ReportKind::Ultrasonic { sensors: [2, 3, 4, 5], indirect: true });
        assert_eq!(kind_for(0x516), ReportKind::Vin { fragment: 2 });
    }

    #[test]
    fn apply_updates_status() {
        let mut status = VehicleStatus::default();
        let vcu = kind_for(VCU_REPORT_ID).decode(&[0, 0, 0x03, 0xE8, 1 << 3, 0, 0, 1]);
        assert!(vcu.apply(&mut status));
        assert!((status.speed - 3.6).abs() < 1e-9);
        assert_eq!(status.driving_mode, DrivingMode::Auto);
        assert_eq!(status.turn_light, TurnLight::Left);

        let wheels = kind_for(WHEEL_SPEED_REPORT_ID).decode(&[0xFF; 8]);
        assert!(!wheels.apply(&mut status));
    }

    proptest! {
        #[test]
        fn pedal_round_trip(pct in 0.0f64..=100.0) {
            let p = ThrottleCommand { enable: true, pedal: pct }.encode();
            let back = PedalReport::decode(&p).pedal;
            prop_assert!((back - pct).abs() <= PEDAL_RESOLUTION);
        }

        #[test]
        fn steering_round_trip(pct in -100.0f64..=100.0) {
            let p = SteeringCommand { enable: true, percent: pct }.encode();
            let back = SteeringReport::decode(&p).percent();
            prop_assert!((back - pct).abs() <= 0.2);
        }

        #[test]
        fn twelve_bit_accel_stays_bounded(b0 in any::<u8>(), b1 in any::<u8>()) {
            let r = VcuReport::decode(&[b0, b1, 0, 0, 0, 0, 0, 0]);
            prop_assert!((-10.0..=10.0).contains(&r.acceleration));
        }
    }
}

//! Turns a command intent into the ordered control frame set for one cycle.

use dbw_protocol::{CommandIntent, Hooke2Intent, LmtIntent, Motor, MotorMode, Protocol};

use crate::hooke2::{
    self, BrakeCommand, CommandKind, GearCommand, ParkCommand, SteeringCommand, ThrottleCommand,
    VehicleModeCommand,
};
use crate::lmt::{self, MotorCommand, ROLLING_MAX, WHEELBASE, WORK_MODE_CURRENT, WORK_MODE_SPEED};
use crate::types::{CanFrame, Payload};

/// Stateful only in the LMT rolling counter; everything else is a pure
/// function of the intent.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    rolling: u8,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolling counter value the next LMT cycle will carry.
    pub fn rolling(&self) -> u8 {
        self.rolling
    }

    /// Restart the counter at 0, as when continuous sending begins.
    pub fn reset_rolling(&mut self) {
        self.rolling = 0;
    }

    /// Frames for one control cycle, in protocol table order. With `reset`
    /// every field is forced to its safe default.
    pub fn build(&mut self, intent: &CommandIntent, reset: bool) -> Vec<CanFrame> {
        match intent {
            CommandIntent::Hooke2(intent) => hooke2_frames(intent, reset),
            CommandIntent::Lmt(intent) => {
                let rolling = self.advance_rolling();
                lmt_frames(intent, rolling, reset)
            }
        }
    }

    /// The disengage set for `protocol`: every frame at its safe default.
    pub fn safe_frames(protocol: Protocol) -> Vec<CanFrame> {
        match protocol {
            Protocol::Hooke2 => hooke2_frames(&Hooke2Intent::default(), true),
            Protocol::Lmt => lmt_frames(&LmtIntent::default(), 0, true),
        }
    }

    fn advance_rolling(&mut self) -> u8 {
        let current = self.rolling;
        self.rolling = if current >= ROLLING_MAX { 0 } else { current + 1 };
        current
    }
}

/// One cycle's worth of Hooke2 commands, before table ordering.
struct Hooke2Commands {
    throttle: ThrottleCommand,
    brake: BrakeCommand,
    steering: SteeringCommand,
    gear: GearCommand,
    park: ParkCommand,
}

impl Hooke2Commands {
    const SAFE: Self = Self {
        throttle: ThrottleCommand::SAFE,
        brake: BrakeCommand::SAFE,
        steering: SteeringCommand::SAFE,
        gear: GearCommand::SAFE,
        park: ParkCommand::SAFE,
    };

    fn from_intent(intent: &Hooke2Intent) -> Self {
        Self {
            throttle: ThrottleCommand {
                enable: true,
                pedal: intent.throttle,
            },
            brake: BrakeCommand {
                enable: true,
                pedal: intent.brake,
            },
            steering: SteeringCommand {
                enable: true,
                percent: intent.steering,
            },
            gear: GearCommand::new(true, intent.gear),
            park: ParkCommand {
                enable: true,
                park: intent.park,
            },
        }
    }

    fn encode(&self, kind: CommandKind) -> Payload {
        match kind {
            CommandKind::Throttle => self.throttle.encode(),
            CommandKind::Brake => self.brake.encode(),
            CommandKind::Steering => self.steering.encode(),
            CommandKind::Gear => self.gear.encode(),
            CommandKind::Park => self.park.encode(),
            CommandKind::VehicleMode => VehicleModeCommand::SAFE.encode(),
        }
    }
}

fn hooke2_frames(intent: &Hooke2Intent, reset: bool) -> Vec<CanFrame> {
    let commands = if reset {
        Hooke2Commands::SAFE
    } else {
        Hooke2Commands::from_intent(intent)
    };
    hooke2::COMMANDS
        .iter()
        .map(|&(id, kind)| CanFrame::control(id, commands.encode(kind)))
        .collect()
}

fn lmt_frames(intent: &LmtIntent, rolling: u8, reset: bool) -> Vec<CanFrame> {
    let (motor1, motor2) = if reset {
        (MotorCommand::SAFE, MotorCommand::SAFE)
    } else {
        match intent.mode {
            MotorMode::Idle => (MotorCommand::SAFE, MotorCommand::SAFE),
            MotorMode::Speed => {
                let (outer, inner) =
                    lmt::differential_speeds(intent.target_speed, intent.target_angle, WHEELBASE);
                let command = |speed| MotorCommand {
                    work_mode: WORK_MODE_SPEED,
                    target_speed: speed,
                    target_current: 0.0,
                    rolling,
                };
                (command(outer), command(inner))
            }
            MotorMode::Current => {
                let command = MotorCommand {
                    work_mode: WORK_MODE_CURRENT,
                    target_speed: 0.0,
                    target_current: intent.target_current,
                    rolling,
                };
                (command, command)
            }
        }
    };

    lmt::COMMANDS
        .iter()
        .map(|&(id, motor)| {
            let payload = match motor {
                // Motor 1 is mounted mirrored.
                Motor::One => motor1.mirrored().encode(),
                Motor::Two => motor2.encode(),
            };
            CanFrame::control(id, payload)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ProtocolBinding;
    use crate::signal::{be_i16, be_u16};
    use dbw_protocol::Gear;
    use proptest::prelude::*;

    fn ids(frames: &[CanFrame]) -> Vec<u32> {
        frames.iter().map(|f| f.id).collect()
    }

    fn driving(throttle: f64, brake: f64, steering: f64, gear: Gear) -> CommandIntent {
        CommandIntent::Hooke2(Hooke2Intent::from_controls(true, throttle, brake, steering, gear))
    }

    fn lmt(mode: MotorMode, speed: f64, angle: f64, current: f64) -> CommandIntent {
        CommandIntent::Lmt(LmtIntent {
            mode,
            target_speed: speed,
            target_angle: angle,
            target_current: current,
        })
    }

    #[test]
    fn hooke2_order_and_enable() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&driving(50.0, 0.0, 0.0, Gear::D), false);
        assert_eq!(ids(&frames), vec![0x100, 0x101, 0x102, 0x103, 0x104, 0x105]);
        for f in &frames[..5] {
            assert_eq!(f.data[0] & 0x01, 1, "{f}");
            assert_eq!(f.dlc(), 8);
        }
        assert_eq!(frames[0].data[3..5], [0x01, 0xF4]);
        assert_eq!(frames[3].data[1], 4);
        assert_eq!(frames[4].data[1], 0); // no park in D
        assert_eq!(frames[5].data, vec![0; 8]);
    }

    #[test]
    fn frames_follow_binding_order() {
        let mut b = CommandBuilder::new();
        let cases = [
            driving(20.0, 0.0, 10.0, Gear::D),
            CommandIntent::idle(Protocol::Hooke2),
            lmt(MotorMode::Speed, 300.0, -15.0, 0.0),
            CommandIntent::idle(Protocol::Lmt),
        ];
        for intent in cases {
            let binding = ProtocolBinding::for_protocol(intent.protocol());
            for reset in [false, true] {
                assert_eq!(ids(&b.build(&intent, reset)), binding.command_ids(), "{intent:?}");
            }
            assert_eq!(ids(&CommandBuilder::safe_frames(intent.protocol())), binding.command_ids());
        }
    }

    #[test]
    fn hooke2_park_in_p() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&driving(0.0, 30.0, 0.0, Gear::P), false);
        assert_eq!(frames[4].data[..2], [1, 1]);
    }

    #[test]
    fn hooke2_reset_is_safe() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&driving(80.0, 40.0, -60.0, Gear::R), true);
        assert_eq!(frames, CommandBuilder::safe_frames(Protocol::Hooke2));
        for f in &frames {
            assert_eq!(f.data[0], 0, "{f}");
        }
        assert_eq!(be_u16(&frames[0].payload(), 3), 0);
        assert_eq!(be_u16(&frames[1].payload(), 3), 0);
        assert_eq!(be_u16(&frames[2].payload(), 3), 500);
        assert_eq!(frames[3].data[1], 0);
    }

    #[test]
    fn lmt_speed_mode_mirrors_motor1() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&lmt(MotorMode::Speed, 1000.0, 0.0, 0.0), false);
        assert_eq!(ids(&frames), vec![0x520, 0x521]);
        assert_eq!(frames[0].data[0], WORK_MODE_SPEED);
        assert_eq!(be_i16(&frames[0].payload(), 3), -4000);
        assert_eq!(be_i16(&frames[1].payload(), 3), 4000);
    }

    #[test]
    fn lmt_speed_mode_turns() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&lmt(MotorMode::Speed, 1000.0, 30.0, 0.0), false);
        // 1288.68 rpm → 5155 (mirrored), 711.32 rpm → 2845
        assert_eq!(be_i16(&frames[0].payload(), 3), -5155);
        assert_eq!(be_i16(&frames[1].payload(), 3), 2845);
    }

    #[test]
    fn lmt_current_mode() {
        let mut b = CommandBuilder::new();
        let frames = b.build(&lmt(MotorMode::Current, 500.0, 10.0, 10.0), false);
        for f in &frames {
            assert_eq!(f.data[0], WORK_MODE_CURRENT);
            assert_eq!(be_i16(&f.payload(), 3), 0);
        }
        assert_eq!(be_i16(&frames[0].payload(), 5), -1280);
        assert_eq!(be_i16(&frames[1].payload(), 5), 1280);
    }

    #[test]
    fn lmt_idle_is_all_zero() {
        let mut b = CommandBuilder::new();
        b.build(&lmt(MotorMode::Speed, 100.0, 0.0, 0.0), false);
        let intent = lmt(MotorMode::Idle, 100.0, 0.0, 5.0);
        let frames = b.build(&intent, intent.requires_safe_reset());
        for f in &frames {
            assert_eq!(f.data, vec![0; 8]);
        }
    }

    #[test]
    fn rolling_counter_wraps_after_sixteen() {
        let mut b = CommandBuilder::new();
        let intent = lmt(MotorMode::Speed, 10.0, 0.0, 0.0);
        let seen: Vec<u8> = (0..19).map(|_| b.build(&intent, false)[1].data[7]).collect();
        let expected: Vec<u8> = (0..=16).chain(0..=1).collect();
        assert_eq!(seen, expected);

        b.reset_rolling();
        assert_eq!(b.build(&intent, false)[0].data[7], 0);
    }

    #[test]
    fn hooke2_does_not_advance_rolling() {
        let mut b = CommandBuilder::new();
        b.build(&driving(0.0, 0.0, 0.0, Gear::N), false);
        assert_eq!(b.rolling(), 0);
    }

    proptest! {
        #[test]
        fn reset_ignores_intent(
            t in -200.0f64..200.0,
            br in -200.0f64..200.0,
            s in -300.0f64..300.0,
            speed in -5000.0f64..5000.0,
            current in -200.0f64..200.0,
        ) {
            let mut b = CommandBuilder::new();
            let hooke2 = b.build(&driving(t, br, s, Gear::D), true);
            prop_assert_eq!(hooke2, CommandBuilder::safe_frames(Protocol::Hooke2));
            let motors = b.build(&lmt(MotorMode::Speed, speed, 20.0, current), true);
            prop_assert_eq!(motors, CommandBuilder::safe_frames(Protocol::Lmt));
        }

        #[test]
        fn build_never_panics(t in any::<f64>(), s in any::<f64>(), speed in any::<f64>(), angle in any::<f64>()) {
            let mut b = CommandBuilder::new();
            prop_assert_eq!(b.build(&driving(t, t, s, Gear::Unknown), false).len(), 6);
            prop_assert_eq!(b.build(&lmt(MotorMode::Speed, speed, angle, 0.0), false).len(), 2);
        }
    }
}

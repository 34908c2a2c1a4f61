use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Nominal CAN bitrate for both vehicle protocols (500 kbit/s).
pub const DEFAULT_BITRATE: u32 = 500_000;

/// Vehicle control protocol spoken on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Single drive-by-wire chassis.
    #[default]
    Hooke2,
    /// Dual-motor differential platform.
    Lmt,
}

impl Protocol {
    /// Fixed control-frame period for continuous mode.
    pub fn send_period(self) -> Duration {
        match self {
            Protocol::Hooke2 => Duration::from_millis(20),
            Protocol::Lmt => Duration::from_millis(10),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Hooke2 => "hooke2",
            Protocol::Lmt => "lmt",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

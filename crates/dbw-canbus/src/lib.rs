//! CAN bus side of the drive-by-wire bridge: frame types, the bus interface,
//! per-protocol codecs, report dispatch and command building.

pub mod binding;
pub mod builder;
pub mod burst;
pub mod dispatcher;
pub mod error;
pub mod hooke2;
pub mod lmt;
pub mod mock;
pub mod signal;
pub mod types;

pub mod interface;

pub use binding::{FrameKind, ProtocolBinding, Report};
pub use builder::CommandBuilder;
pub use burst::{BurstParams, BurstRequest};
pub use dispatcher::{ReportDispatcher, SharedVehicleStatus};
pub use error::{CanError, CanResult};
pub use interface::CanInterface;
#[cfg(target_os = "linux")]
pub use interface::SocketCanInterface;
pub use mock::MockCanInterface;
pub use types::{CanFrame, FRAME_LEN, Payload};

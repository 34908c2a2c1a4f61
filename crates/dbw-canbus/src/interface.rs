//! CAN bus interface abstraction.
//!
//! `CanInterface` trait with bounded `send_frame`/`recv_frame` and an
//! idempotent `shutdown`. Two impls:
//! - `SocketCanInterface`: Linux-only, wraps the tokio `socketcan::tokio::CanSocket`
//! - `MockCanInterface`: all platforms, scripted responses (in `mock.rs`)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{CanError, CanResult};
use crate::types::CanFrame;

/// Trait for CAN bus interface implementations.
///
/// One handle is shared by every loop of a session, so all methods take
/// `&self`.
#[async_trait]
pub trait CanInterface: Send + Sync {
    /// Send a CAN frame, giving up after `timeout`.
    async fn send_frame(&self, frame: &CanFrame, timeout: Duration) -> CanResult<()>;

    /// Receive a CAN frame, blocking up to `timeout`.
    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame>;

    /// Close the bus. Calling it again is a no-op.
    async fn shutdown(&self) -> CanResult<()>;
}

pub(crate) fn timeout_error(timeout: Duration) -> CanError {
    CanError::Timeout {
        timeout_ms: timeout.as_millis() as u64,
    }
}

// ── SocketCAN (Linux-only) ──────────────────────────────────────

#[cfg(target_os = "linux")]
pub use self::linux::SocketCanInterface;

#[cfg(target_os = "linux")]
mod linux {
    use async_trait::async_trait;
    use socketcan::tokio::CanSocket;
    use socketcan::{CanFrame as RawFrame, EmbeddedFrame, ExtendedId, Id, StandardId};
    use std::time::Duration;
    use tokio::sync::RwLock;

    use super::{CanInterface, timeout_error};
    use crate::error::{CanError, CanResult};
    use crate::types::CanFrame;

    /// SocketCAN interface for Linux hosts.
    ///
    /// The bitrate is a property of the kernel link (`ip link set can0 type
    /// can bitrate 500000`); it is recorded here for logging only.
    pub struct SocketCanInterface {
        channel: String,
        bitrate: u32,
        socket: RwLock<Option<CanSocket>>,
    }

    impl SocketCanInterface {
        /// Bind a raw CAN socket on `channel`. Must run inside a tokio runtime.
        pub fn open(channel: &str, bitrate: u32) -> CanResult<Self> {
            let socket = CanSocket::open(channel).map_err(|e| CanError::Open {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
            tracing::info!(channel, bitrate, "SocketCAN channel opened");
            Ok(Self {
                channel: channel.to_string(),
                bitrate,
                socket: RwLock::new(Some(socket)),
            })
        }
    }

    fn to_raw(frame: &CanFrame) -> CanResult<RawFrame> {
        frame.validate()?;
        let id = if frame.extended {
            ExtendedId::new(frame.id).map(Id::Extended)
        } else {
            u16::try_from(frame.id)
                .ok()
                .and_then(StandardId::new)
                .map(Id::Standard)
        };
        let id = id.ok_or_else(|| {
            CanError::InvalidFrame(format!("bad identifier 0x{:X}", frame.id))
        })?;
        RawFrame::new(id, &frame.data)
            .ok_or_else(|| CanError::InvalidFrame(format!("cannot build frame {frame}")))
    }

    fn from_raw(id: Id, data: &[u8]) -> CanFrame {
        match id {
            Id::Standard(id) => CanFrame::new(u32::from(id.as_raw()), data.to_vec()),
            Id::Extended(id) => CanFrame::new_extended(id.as_raw(), data.to_vec()),
        }
    }

    #[async_trait]
    impl CanInterface for SocketCanInterface {
        async fn send_frame(&self, frame: &CanFrame, timeout: Duration) -> CanResult<()> {
            let raw = to_raw(frame)?;
            let guard = self.socket.read().await;
            let socket = guard.as_ref().ok_or(CanError::Closed)?;
            tokio::time::timeout(timeout, socket.write_frame(raw))
                .await
                .map_err(|_| timeout_error(timeout))?
                .map_err(|e| CanError::Interface(e.to_string()))
        }

        async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
            let guard = self.socket.read().await;
            let socket = guard.as_ref().ok_or(CanError::Closed)?;
            let read = async {
                loop {
                    match socket.read_frame().await {
                        Ok(RawFrame::Data(f)) => return Ok(from_raw(f.id(), f.data())),
                        // Remote and error frames carry nothing to decode.
                        Ok(_) => continue,
                        Err(e) => return Err(CanError::Interface(e.to_string())),
                    }
                }
            };
            tokio::time::timeout(timeout, read)
                .await
                .map_err(|_| timeout_error(timeout))?
        }

        async fn shutdown(&self) -> CanResult<()> {
            if self.socket.write().await.take().is_some() {
                tracing::info!(
                    channel = %self.channel,
                    bitrate = self.bitrate,
                    "SocketCAN channel closed"
                );
            }
            Ok(())
        }
    }

}

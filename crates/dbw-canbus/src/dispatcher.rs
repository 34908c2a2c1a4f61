//! Routes received frames to their decoder and folds the result into the
//! shared vehicle status.

use std::sync::Arc;

use chrono::Utc;
use dbw_protocol::VehicleStatus;
use tokio::sync::RwLock;

use crate::binding::{ProtocolBinding, Report};
use crate::types::CanFrame;

/// Vehicle status shared between the dispatcher (sole writer) and readers.
pub type SharedVehicleStatus = Arc<RwLock<VehicleStatus>>;

pub struct ReportDispatcher {
    binding: ProtocolBinding,
    status: SharedVehicleStatus,
}

impl ReportDispatcher {
    pub fn new(binding: ProtocolBinding, status: SharedVehicleStatus) -> Self {
        Self { binding, status }
    }

    pub fn binding(&self) -> &ProtocolBinding {
        &self.binding
    }

    pub fn status(&self) -> SharedVehicleStatus {
        Arc::clone(&self.status)
    }

    /// Decode and apply one frame. Unbound identifiers return `None` and
    /// leave the status untouched.
    pub async fn dispatch(&self, frame: &CanFrame) -> Option<Report> {
        let Some(report) = self.binding.decode(frame) else {
            tracing::trace!(frame = %frame, "unbound frame dropped");
            return None;
        };
        tracing::debug!(id = frame.id, report = ?report, "decoded report");

        let mut status = self.status.write().await;
        if report.apply(&mut status) {
            status.touch(Utc::now());
        }
        Some(report)
    }
}

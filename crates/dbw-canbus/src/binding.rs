//! Per-protocol dispatch table: frame identifier → report decoder.

use std::collections::HashMap;

use dbw_protocol::{Protocol, VehicleStatus};

use crate::hooke2::{self, Hooke2Report};
use crate::lmt::{self, LmtReport};
use crate::types::{CanFrame, Payload};

/// Decoder selected for one bound identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Hooke2(hooke2::ReportKind),
    Lmt(lmt::ReportKind),
}

impl FrameKind {
    pub fn decode(self, payload: &Payload) -> Report {
        match self {
            FrameKind::Hooke2(kind) => Report::Hooke2(kind.decode(payload)),
            FrameKind::Lmt(kind) => Report::Lmt(kind.decode(payload)),
        }
    }
}

/// Any decoded report.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Hooke2(Hooke2Report),
    Lmt(LmtReport),
}

impl Report {
    /// Write the report into `status`; returns whether it wrote any
    /// status field. Reports with no status counterpart return false.
    pub fn apply(&self, status: &mut VehicleStatus) -> bool {
        match self {
            Report::Hooke2(report) => report.apply(status),
            Report::Lmt(report) => report.apply(status),
        }
    }
}

/// Immutable identifier → decoder table for one protocol, built once per
/// session.
#[derive(Debug, Clone)]
pub struct ProtocolBinding {
    protocol: Protocol,
    reports: HashMap<u32, FrameKind>,
}

impl ProtocolBinding {
    pub fn for_protocol(protocol: Protocol) -> Self {
        let reports = match protocol {
            Protocol::Hooke2 => hooke2::REPORTS
                .iter()
                .map(|&(id, kind)| (id, FrameKind::Hooke2(kind)))
                .collect(),
            Protocol::Lmt => lmt::REPORTS
                .iter()
                .map(|&(id, kind)| (id, FrameKind::Lmt(kind)))
                .collect(),
        };
        Self { protocol, reports }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn lookup(&self, id: u32) -> Option<FrameKind> {
        self.reports.get(&id).copied()
    }

    /// Decode `frame` if its identifier is bound. Extended-addressed frames
    /// never match; both protocols use 11-bit identifiers.
    pub fn decode(&self, frame: &CanFrame) -> Option<Report> {
        if frame.extended {
            return None;
        }
        let kind = self.lookup(frame.id)?;
        Some(kind.decode(&frame.payload()))
    }

    /// Number of bound report identifiers.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Outbound command identifiers in transmission order.
    pub fn command_ids(&self) -> Vec<u32> {
        match self.protocol {
            Protocol::Hooke2 => hooke2::COMMANDS.iter().map(|&(id, _)| id).collect(),
            Protocol::Lmt => lmt::COMMANDS.iter().map(|&(id, _)| id).collect(),
        }
    }
}

//! Operator-side inputs sampled by the session loops.

use std::sync::{PoisonError, RwLock};

use dbw_canbus::BurstParams;
use dbw_protocol::CommandIntent;

/// Supplies the live command intent once per control cycle.
pub trait IntentSource: Send + Sync {
    fn current(&self) -> CommandIntent;
}

/// Supplies burst-send parameters as typed by the operator.
pub trait BurstSource: Send + Sync {
    fn params(&self) -> BurstParams;
}

/// Intent held in memory and replaced wholesale by the operator.
#[derive(Debug)]
pub struct SharedIntent {
    intent: RwLock<CommandIntent>,
}

impl SharedIntent {
    pub fn new(intent: CommandIntent) -> Self {
        Self {
            intent: RwLock::new(intent),
        }
    }

    pub fn set(&self, intent: CommandIntent) {
        *self.intent.write().unwrap_or_else(PoisonError::into_inner) = intent;
    }
}

impl IntentSource for SharedIntent {
    fn current(&self) -> CommandIntent {
        self.intent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Default)]
pub struct SharedBurstParams {
    params: RwLock<BurstParams>,
}

impl SharedBurstParams {
    pub fn new(params: BurstParams) -> Self {
        Self {
            params: RwLock::new(params),
        }
    }

    pub fn set(&self, params: BurstParams) {
        *self.params.write().unwrap_or_else(PoisonError::into_inner) = params;
    }
}

impl BurstSource for SharedBurstParams {
    fn params(&self) -> BurstParams {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

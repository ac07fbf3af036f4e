//! Server state

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::deploy::orchestrator::Orchestrator;

/// Server state shared across handlers
pub struct ServerState {
    pub orchestrator: Arc<Orchestrator>,

    /// Required setting name -> whether it is configured
    pub config_status: BTreeMap<String, bool>,
}

impl ServerState {
    pub fn new(orchestrator: Arc<Orchestrator>, config_status: BTreeMap<String, bool>) -> Self {
        Self {
            orchestrator,
            config_status,
        }
    }

    /// Whether every required setting is present
    pub fn is_configured(&self) -> bool {
        self.config_status.values().all(|configured| *configured)
    }
}

//! Application State

use std::sync::Arc;

use agent_core::{Agent, SessionLimits, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent with its provider and tool registry
    pub agent: Arc<Agent>,

    /// One conversation per `conversation_id`
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(agent: Agent, limits: SessionLimits) -> Self {
        Self {
            agent: Arc::new(agent),
            sessions: Arc::new(SessionStore::with_limits(limits)),
        }
    }
}

//! Session Management
//!
//! A session owns exactly one conversation. Sessions never share state, so
//! any number of them can run side by side against the same [`Agent`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::message::{Conversation, Role};
use crate::provider::DEFAULT_MODEL;
use crate::reasoning::{Agent, AgentInput, AgentOutcome};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Session title (auto-generated or user-set)
    pub title: Option<String>,

    /// Model used for this session
    pub model: String,

    /// Completion requests made across all inputs
    pub total_turns: usize,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self {
            title: None,
            model: DEFAULT_MODEL.into(),
            total_turns: 0,
        }
    }
}

/// A complete agent session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Conversation history
    pub conversation: Conversation,

    /// Session metadata
    pub metadata: SessionMetadata,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            conversation: Conversation::new(),
            metadata: SessionMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let mut session = Self::new();
        session.id = id;
        session
    }

    /// Create with system prompt
    pub fn with_system_prompt(system_prompt: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.conversation = Conversation::with_system_prompt(system_prompt);
        session
    }

    /// Feed one input through the agent and record the outcome
    pub async fn send(
        &mut self,
        agent: &Agent,
        input: impl Into<AgentInput>,
    ) -> Result<AgentOutcome> {
        let result = agent.run(&mut self.conversation, input).await;
        if let Ok(outcome) = &result {
            self.metadata.total_turns += outcome.turns();
        }
        self.touch();
        result
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Set session title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
        self.touch();
    }

    /// Get or generate title
    pub fn title(&self) -> String {
        self.metadata.title.clone().unwrap_or_else(|| {
            // Generate from first user message
            self.conversation
                .messages()
                .iter()
                .find(|m| m.role == Role::User)
                .map_or_else(
                    || format!("Session {}", self.id.0.chars().take(8).collect::<String>()),
                    |m| {
                        let preview: String = m.content.chars().take(50).collect();
                        if m.content.chars().count() > 50 {
                            format!("{preview}...")
                        } else {
                            preview
                        }
                    },
                )
        })
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds on how many sessions a [`SessionStore`] keeps alive
#[derive(Clone, Copy, Debug)]
pub struct SessionLimits {
    /// Sessions kept at most; the least recently active one goes first
    pub max_sessions: usize,

    /// Sessions idle for longer than this are dropped
    pub max_idle: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            max_idle: Duration::from_secs(60 * 60),
        }
    }
}

/// In-memory session store
///
/// Each session sits behind its own lock, so two requests for the same
/// session are serialized while different sessions proceed independently.
/// Expired and excess sessions are pruned whenever a new one is created;
/// a session whose lock is held is never pruned. Nothing survives a
/// process restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            sessions: RwLock::default(),
            limits,
        }
    }

    /// Fetch an existing session, or insert one built by `create`
    pub async fn get_or_create(
        &self,
        id: Option<SessionId>,
        create: impl FnOnce() -> Session,
    ) -> (SessionId, Arc<Mutex<Session>>) {
        if let Some(id) = &id {
            if let Some(session) = self.sessions.read().await.get(id) {
                return (id.clone(), Arc::clone(session));
            }
        }

        let mut session = create();
        if let Some(id) = id {
            session.id = id;
        }
        let id = session.id.clone();

        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&id) {
            self.prune(&mut sessions);
        }
        let entry = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        (id, Arc::clone(entry))
    }

    /// Drop idle sessions, then the least recently active ones until a new
    /// session fits under `max_sessions`
    fn prune(&self, sessions: &mut HashMap<SessionId, Arc<Mutex<Session>>>) {
        let before = sessions.len();
        let now = Utc::now();

        if let Ok(max_idle) = chrono::Duration::from_std(self.limits.max_idle) {
            sessions.retain(|_, session| {
                session
                    .try_lock()
                    .map_or(true, |s| now - s.updated_at <= max_idle)
            });
        }

        while sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .filter_map(|(id, session)| {
                    session.try_lock().ok().map(|s| (id.clone(), s.updated_at))
                })
                .min_by_key(|(_, updated_at)| *updated_at)
                .map(|(id, _)| id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Pruned sessions");
        }
    }

    /// Load a session by ID
    pub async fn get(&self, id: &SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session and its conversation
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

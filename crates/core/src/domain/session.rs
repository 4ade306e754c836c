//! Conversation session and turn types (C9 data model).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Voice,
    Text,
}

/// A single turn in a conversation. `metadata` carries, for assistant
/// turns, the enhanced query, retrieved chunk ids, extracted citations
/// and confidence label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub turn_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub input_mode: InputMode,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Turn {
    pub fn user(content: impl Into<String>, input_mode: InputMode, now: DateTime<Utc>) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            role: TurnRole::User,
            content: content.into(),
            timestamp: now,
            input_mode,
            metadata: HashMap::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: now,
            input_mode: InputMode::Text,
            metadata: HashMap::new(),
        }
    }
}

/// Bound on the rolling working set of regulations tracked per session.
pub const MAX_ACTIVE_REGULATIONS: usize = 20;

/// A conversation session: ordered turns plus a rolling working set used
/// by coreference resolution and context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub turns: Vec<Turn>,
    pub active_regulations: VecDeque<String>,
    pub active_topics: Vec<String>,
    pub active_ship_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: Uuid, user_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            turns: Vec::new(),
            active_regulations: VecDeque::new(),
            active_topics: Vec::new(),
            active_ship_type: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Pushes a regulation id to the front of the working set, trimming
    /// the back to `MAX_ACTIVE_REGULATIONS` and removing any duplicate.
    pub fn touch_regulation(&mut self, regulation_id: &str) {
        self.active_regulations.retain(|r| r != regulation_id);
        self.active_regulations.push_front(regulation_id.to_string());
        self.active_regulations.truncate(MAX_ACTIVE_REGULATIONS);
    }

    pub fn last_assistant_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == TurnRole::Assistant)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_activity) > ttl
    }
}

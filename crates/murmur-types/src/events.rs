use serde::{Deserialize, Serialize};

use crate::models::{Message, UserId};

/// Events emitted by a conversation poller on every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SyncEvent {
    /// Full conversation between viewer and peer, oldest first
    Conversation {
        viewer_id: UserId,
        peer_id: UserId,
        messages: Vec<Message>,
        fetched_at: chrono::DateTime<chrono::Utc>,
    },

    /// The tick failed; the next tick tries again
    FetchFailed {
        viewer_id: UserId,
        peer_id: UserId,
        reason: String,
    },
}

impl SyncEvent {
    /// The (viewer, peer) pair this event belongs to.
    pub fn pair(&self) -> (UserId, UserId) {
        match self {
            Self::Conversation {
                viewer_id, peer_id, ..
            }
            | Self::FetchFailed {
                viewer_id, peer_id, ..
            } => (*viewer_id, *peer_id),
        }
    }

    pub fn messages(&self) -> Option<&[Message]> {
        match self {
            Self::Conversation { messages, .. } => Some(messages.as_slice()),
            Self::FetchFailed { .. } => None,
        }
    }
}

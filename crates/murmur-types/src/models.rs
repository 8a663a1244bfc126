use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type MessageId = i64;

/// Emoji offered by the chat reaction picker. Any string is still accepted
/// as a reaction; this list is only what the picker shows.
pub const REACTION_PALETTE: [&str; 6] = ["👍", "❤️", "😂", "😢", "😮", "😡"];

/// A logged-in account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Directory entry used when picking someone to chat with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
}

/// A direct message, joined with its sender's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub sender_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub reaction: Option<String>,
}

impl Message {
    pub fn is_from(&self, user_id: UserId) -> bool {
        self.sender_id == user_id
    }
}

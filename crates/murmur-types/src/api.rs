use serde::{Deserialize, Serialize};

use crate::models::{ChatUser, MessageId, User, UserId};

// -- Auth --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            profile_image: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: User,
}

// -- Messages --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResponse {
    pub message_id: MessageId,
}

// -- Reactions --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionRequest {
    pub message_id: MessageId,
    pub emoji: String,
}

/// State of a message's reaction after a set/clear/toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionResponse {
    pub message_id: MessageId,
    pub reaction: Option<String>,
}

// -- Directory / account --

#[derive(Debug, Clone, Serialize)]
pub struct ChatListResponse {
    pub users: Vec<ChatUser>,
    pub unread_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAccountResponse {
    pub user_id: UserId,
    pub messages_deleted: usize,
}

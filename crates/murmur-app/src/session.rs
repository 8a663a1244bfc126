use std::time::Duration;

use tracing::info;

use murmur_api::{ApiError, AppState, account, auth, messages, reactions, users};
use murmur_types::api::{
    ChatListResponse, DeleteAccountResponse, LoginRequest, ReactionRequest, ReactionResponse,
    RegisterRequest, RegisterResponse, SendMessageRequest, SendMessageResponse,
};
use murmur_types::models::{Message, MessageId, User, UserId};

use crate::sync::ConversationPoller;

/// The signed-in user plus everything the screens do on their behalf.
pub struct Session {
    state: AppState,
    poll_interval: Duration,
    user: Option<User>,
}

impl Session {
    pub fn new(state: AppState, poll_interval: Duration) -> Self {
        Self {
            state,
            poll_interval,
            user: None,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn require_user(&self) -> Result<&User, ApiError> {
        self.user.as_ref().ok_or(ApiError::Unauthenticated)
    }

    /// Creates the account without logging in.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ApiError> {
        auth::register(&self.state, req).await
    }

    pub async fn login(&mut self, req: LoginRequest) -> Result<&User, ApiError> {
        let resp = auth::login(&self.state, req).await?;
        let user: &User = self.user.insert(resp.user);
        Ok(user)
    }

    pub fn logout(&mut self) -> Option<User> {
        let user = self.user.take();
        if let Some(user) = &user {
            info!("User '{}' logged out", user.username);
        }
        user
    }

    /// Everyone else, plus how many messages are waiting for us.
    pub async fn chat_list(&self) -> Result<ChatListResponse, ApiError> {
        let me = self.require_user()?.id;
        let (users, unread_count) = tokio::try_join!(
            users::list_chat_users(&self.state, me),
            messages::unread_count(&self.state, me)
        )?;
        Ok(ChatListResponse {
            users,
            unread_count,
        })
    }

    pub async fn send(
        &self,
        peer_id: UserId,
        body: impl Into<String>,
    ) -> Result<SendMessageResponse, ApiError> {
        let me = self.require_user()?.id;
        messages::send_message(
            &self.state,
            SendMessageRequest {
                sender_id: me,
                receiver_id: peer_id,
                body: body.into(),
            },
        )
        .await
    }

    pub async fn conversation(&self, peer_id: UserId) -> Result<Vec<Message>, ApiError> {
        let me = self.require_user()?.id;
        messages::get_conversation(&self.state, me, peer_id).await
    }

    /// Reaction picker semantics: the same emoji again removes it.
    pub async fn react(
        &self,
        message_id: MessageId,
        emoji: impl Into<String>,
    ) -> Result<ReactionResponse, ApiError> {
        self.require_user()?;
        reactions::toggle_reaction(
            &self.state,
            ReactionRequest {
                message_id,
                emoji: emoji.into(),
            },
        )
        .await
    }

    /// Poller for the chat with `peer_id`. Call `start()` when the chat is shown.
    pub fn open_chat(&self, peer_id: UserId) -> Result<ConversationPoller, ApiError> {
        let me = self.require_user()?.id;
        Ok(ConversationPoller::new(
            self.state.clone(),
            me,
            peer_id,
            self.poll_interval,
        ))
    }

    /// Delete the signed-in account and everything it sent or received,
    /// then log out.
    pub async fn delete_account(&mut self) -> Result<DeleteAccountResponse, ApiError> {
        let me = self.require_user()?.id;
        let resp = account::delete_account(&self.state, me).await?;
        self.user = None;
        Ok(resp)
    }
}

use tracing::{debug, error};

use murmur_db::models::MessageRow;
use murmur_types::api::{SendMessageRequest, SendMessageResponse};
use murmur_types::models::{Message, UserId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::validation::validate_message_body;
use crate::{parse_db_timestamp, run_blocking};

pub async fn send_message(
    state: &AppState,
    req: SendMessageRequest,
) -> Result<SendMessageResponse, ApiError> {
    let body = validate_message_body(&req.body)?;
    let (sender_id, receiver_id) = (req.sender_id, req.receiver_id);

    let message_id = run_blocking(state, move |db| {
        db.insert_message(sender_id, receiver_id, &body).map_err(|e| {
            error!("Error sending message: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    debug!("Message {} sent {} -> {}", message_id, sender_id, receiver_id);
    Ok(SendMessageResponse { message_id })
}

/// Every message exchanged between the two users, oldest first.
/// Callers render this order as-is.
pub async fn get_conversation(
    state: &AppState,
    user_a: UserId,
    user_b: UserId,
) -> Result<Vec<Message>, ApiError> {
    let rows = run_blocking(state, move |db| {
        db.get_conversation(user_a, user_b).map_err(|e| {
            error!("Error getting messages: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    Ok(rows.into_iter().map(message_from_row).collect())
}

/// Flip everything `sender_id` sent to `receiver_id` to read.
/// Returns the number of messages that changed.
pub async fn mark_read(
    state: &AppState,
    sender_id: UserId,
    receiver_id: UserId,
) -> Result<usize, ApiError> {
    run_blocking(state, move |db| {
        db.mark_read(sender_id, receiver_id).map_err(|e| {
            error!("Error marking messages as read: {}", e);
            ApiError::from(e)
        })
    })
    .await
}

pub async fn unread_count(state: &AppState, viewer_id: UserId) -> Result<u64, ApiError> {
    run_blocking(state, move |db| {
        db.unread_count(viewer_id).map_err(|e| {
            error!("Error getting unread message count: {}", e);
            ApiError::from(e)
        })
    })
    .await
}

fn message_from_row(row: MessageRow) -> Message {
    let created_at = parse_db_timestamp(&row.created_at, &format!("message {}", row.id));
    Message {
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        sender_username: row.sender_username,
        body: row.body,
        created_at,
        is_read: row.is_read,
        reaction: row.reaction,
    }
}

use tracing::{debug, error};

use murmur_types::api::{ReactionRequest, ReactionResponse};
use murmur_types::models::MessageId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Replace the message's reaction. Any string is accepted; last write wins.
pub async fn set_reaction(
    state: &AppState,
    req: ReactionRequest,
) -> Result<ReactionResponse, ApiError> {
    let ReactionRequest { message_id, emoji } = req;
    let stored = emoji.clone();

    run_blocking(state, move |db| {
        db.set_reaction(message_id, Some(stored.as_str())).map_err(|e| {
            error!("Error adding reaction: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    debug!("Reaction on message {} set to {}", message_id, emoji);
    Ok(ReactionResponse {
        message_id,
        reaction: Some(emoji),
    })
}

pub async fn clear_reaction(
    state: &AppState,
    message_id: MessageId,
) -> Result<ReactionResponse, ApiError> {
    run_blocking(state, move |db| {
        db.set_reaction(message_id, None).map_err(|e| {
            error!("Error removing reaction: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    debug!("Reaction on message {} cleared", message_id);
    Ok(ReactionResponse {
        message_id,
        reaction: None,
    })
}

/// Picking the emoji that is already on the message removes it;
/// any other emoji replaces it.
pub async fn toggle_reaction(
    state: &AppState,
    req: ReactionRequest,
) -> Result<ReactionResponse, ApiError> {
    let ReactionRequest { message_id, emoji } = req;

    let reaction = run_blocking(state, move |db| {
        db.toggle_reaction(message_id, &emoji).map_err(|e| {
            error!("Failed to update reaction: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    Ok(ReactionResponse {
        message_id,
        reaction,
    })
}

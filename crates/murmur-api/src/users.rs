use tracing::error;

use murmur_types::models::{ChatUser, UserId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Everyone the viewer can start a chat with.
pub async fn list_chat_users(
    state: &AppState,
    viewer_id: UserId,
) -> Result<Vec<ChatUser>, ApiError> {
    let rows = run_blocking(state, move |db| {
        db.list_users_except(viewer_id).map_err(|e| {
            error!("Error getting chat users: {}", e);
            ApiError::from(e)
        })
    })
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ChatUser {
            id: row.id,
            username: row.username,
            email: row.email,
            profile_image: row.profile_image,
        })
        .collect())
}

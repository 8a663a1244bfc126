use tracing::{error, info};

use murmur_types::api::DeleteAccountResponse;
use murmur_types::models::UserId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Remove the user and every message they sent or received.
/// Both deletes share one transaction; a failure leaves everything in place.
pub async fn delete_account(
    state: &AppState,
    user_id: UserId,
) -> Result<DeleteAccountResponse, ApiError> {
    let messages_deleted = run_blocking(state, move |db| {
        db.delete_user_cascade(user_id).map_err(|e| {
            error!("Error deleting user {}: {}", user_id, e);
            ApiError::from(e)
        })
    })
    .await?;

    info!(
        "Deleted user {} and {} messages",
        user_id, messages_deleted
    );
    Ok(DeleteAccountResponse {
        user_id,
        messages_deleted,
    })
}

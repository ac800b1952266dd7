pub mod get;
pub mod settings;

pub use get::handle_get_me;
pub use settings::{handle_change_password, handle_delete_me};

use tracing::{info, warn};

use shared::types::UserId;

use crate::AppState;
use crate::database::users;
use crate::error::ApiError;

/// Delete an account by id.  The root administrator is never deleted.
pub(crate) async fn delete_account(state: &AppState, id: UserId) -> Result<(), ApiError> {
    let user = users::get_user(&state.db, id).await?;

    if user.name == *state.root_admin {
        warn!("Refused to delete root administrator {}", user.id);
        return Err(ApiError::Forbidden);
    }

    users::delete_user(&state.db, id).await?;
    info!("Account removed: {} (ID: {})", user.name, user.id);
    Ok(())
}

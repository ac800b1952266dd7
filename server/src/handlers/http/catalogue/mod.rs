//! Products, recipes, plans and ratings.

pub mod plans;
pub mod products;
pub mod ratings;
pub mod recipes;

use tracing::warn;

use shared::types::UserId;

use crate::AppState;
use crate::database::usage::{self, UsageTarget};
use crate::error::ApiError;
use crate::security::Identity;

/// Who besides the owner may touch an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ownership {
    OwnerOnly,
    OwnerOrAdmin,
}

pub(crate) fn ensure_owner(owner: UserId, who: Identity, rule: Ownership) -> Result<(), ApiError> {
    let allowed = owner == who.user_id || (rule == Ownership::OwnerOrAdmin && who.admin);
    if !allowed {
        warn!("User {} is not allowed to modify data owned by {}", who.user_id, owner);
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

/// Veto the delete of an entity that another aggregate still points at.
pub(crate) async fn ensure_unused(state: &AppState, target: UsageTarget) -> Result<(), ApiError> {
    if !usage::can_delete(&state.db, target).await? {
        warn!("Refused to delete {:?}: still referenced", target);
        return Err(ApiError::Conflict(format!("{} in use", target.entity())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(admin: bool) -> Identity {
        Identity { user_id: UserId::generate(), admin }
    }

    #[test]
    fn owner_is_always_allowed() {
        let who = caller(false);
        assert!(ensure_owner(who.user_id, who, Ownership::OwnerOnly).is_ok());
    }

    #[test]
    fn admin_only_helps_where_allowed() {
        let owner = UserId::generate();
        let admin = caller(true);
        assert!(ensure_owner(owner, admin, Ownership::OwnerOrAdmin).is_ok());
        assert!(matches!(
            ensure_owner(owner, admin, Ownership::OwnerOnly),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn stranger_is_forbidden() {
        assert!(ensure_owner(UserId::generate(), caller(false), Ownership::OwnerOrAdmin).is_err());
    }
}

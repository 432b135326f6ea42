//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dms_core::types::UserId;
use dms_entity::user::UserRole;

/// The actor of an operation.
///
/// Passed into every service method that stamps ownership or checks
/// permissions; nothing reads the actor from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// The user's system-wide role.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            request_time: Utc::now(),
        }
    }

    /// Context of a logged-in, non-admin user.
    pub fn member(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Member)
    }

    /// Context of an administrator.
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Admin)
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

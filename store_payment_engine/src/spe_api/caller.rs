use serde::{Deserialize, Serialize};

use crate::db_types::{Order, UserId};

/// The authenticated identity on whose behalf an API call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: UserId) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self { user_id, is_admin: true }
    }

    /// Administrators see every order. Everyone else sees only the orders they own.
    pub fn can_view_order(&self, order: &Order) -> bool {
        self.is_admin || order.owner_id == Some(self.user_id)
    }
}

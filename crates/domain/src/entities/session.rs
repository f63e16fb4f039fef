//! The signed-in member, passed explicitly into every use case that needs
//! an identity.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::value_objects::{DeletePolicy, Handle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub handle: Option<Handle>,
    pub is_admin: bool,
}

impl Session {
    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            handle: None,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            handle: None,
            is_admin: true,
        }
    }

    pub fn with_handle(mut self, handle: Option<Handle>) -> Self {
        self.handle = handle;
        self
    }

    /// Whether this member may delete content written by `author`.
    pub fn can_delete(&self, author: &UserId, policy: DeletePolicy) -> bool {
        match policy {
            DeletePolicy::Never => false,
            DeletePolicy::AdminOnly => self.is_admin,
            DeletePolicy::OwnerOrAdmin => self.is_admin || &self.user_id == author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_or_admin_policy() {
        let owner = UserId::new("owner").unwrap();
        let other = Session::member(UserId::new("other").unwrap());
        let admin = Session::admin(UserId::new("mod").unwrap());

        assert!(Session::member(owner.clone()).can_delete(&owner, DeletePolicy::OwnerOrAdmin));
        assert!(!other.can_delete(&owner, DeletePolicy::OwnerOrAdmin));
        assert!(admin.can_delete(&owner, DeletePolicy::OwnerOrAdmin));
        assert!(!admin.can_delete(&owner, DeletePolicy::Never));
        assert!(!Session::member(owner.clone()).can_delete(&owner, DeletePolicy::AdminOnly));
    }
}

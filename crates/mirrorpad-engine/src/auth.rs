use std::cell::RefCell;

use crate::models::User;

/// Source of the signed-in user. `None` means the engine is not ready to sync.
pub trait AuthProvider {
    fn current_user(&self) -> Option<User>;
    fn sign_out(&self);
}

/// Auth provider for a single local user known up front
#[derive(Debug, Default)]
pub struct LocalAuth {
    user: RefCell<Option<User>>,
}

impl LocalAuth {
    pub fn signed_in(user: User) -> Self {
        Self {
            user: RefCell::new(Some(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user: User) {
        *self.user.borrow_mut() = Some(user);
    }
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn sign_out(&self) {
        if let Some(user) = self.user.borrow_mut().take() {
            log::info!("Signed out {}", user.email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_sign_out_clears_user() {
        let auth = LocalAuth::signed_in(User {
            id: UserId::from("u1"),
            email: "u1@example.com".to_string(),
        });
        assert!(auth.current_user().is_some());

        auth.sign_out();

        assert!(auth.current_user().is_none());
    }
}

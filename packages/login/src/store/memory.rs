use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use super::UserStore;
use crate::error::AuthError;
use crate::models::User;

/// In-memory UserStore for testing and running without a database.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users created so far.
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn create(&self, name: &str, email: &str) -> Result<User, AuthError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(AuthError::StoreFailure(format!(
                "a user with email {email} already exists"
            )));
        }
        let user = User::new(name, email);
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }
}

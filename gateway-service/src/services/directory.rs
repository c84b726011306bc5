use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::error::StoreError;
use crate::models::{NewUser, User, UserUpdate};

/// Persistent user records keyed by unique email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with `StoreError::Conflict` when the email already has a record.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, user_id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError>;
}

/// Directory held in process memory, keyed by email.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, User>,
    unavailable: AtomicBool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the backing store were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(anyhow::anyhow!(
                "user directory is unavailable"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.users.get(email).map(|u| u.clone()))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self
            .users
            .iter()
            .find(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.check_available()?;
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let user = User::from_new(new_user);
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn update(&self, user_id: Uuid, update: UserUpdate) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let Some(mut entry) = self.users.iter_mut().find(|entry| entry.user_id == user_id) else {
            return Ok(None);
        };
        entry.apply(&update);
        Ok(Some(entry.value().clone()))
    }
}

//! In-memory account store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use gcm_core::types::UserId;
use gcm_core::{AppError, AppResult};
use gcm_entity::user::{NewUser, SecurityState, User};

use super::Availability;
use crate::store::UserStore;

/// Account store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    availability: Availability,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set_unavailable(unavailable);
    }

    /// Display name of a user, if known. Ignores the outage switch.
    pub async fn display_name(&self, id: UserId) -> Option<String> {
        self.users
            .read()
            .await
            .get(&id)
            .map(|u| u.display_name.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.availability.check()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.availability.check()?;
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        self.availability.check()?;
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&data.username))
        {
            return Err(AppError::conflict(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: data.username.clone(),
            display_name: data.display_name.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            failed_attempts: 0,
            is_blocked: false,
            blocked_at: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save_security_state(&self, id: UserId, state: &SecurityState) -> AppResult<()> {
        self.availability.check()?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.apply_security_state(state);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        self.availability.check()?;
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn find_blocked(&self) -> AppResult<Vec<User>> {
        self.availability.check()?;
        let mut blocked: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.is_blocked)
            .cloned()
            .collect();
        blocked.sort_by_key(|u| u.blocked_at);
        Ok(blocked)
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{KvStore, TOKEN_KEY, USER_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: AppUser,
    pub token: String,
}

/// Logged-in user and raw JWT (no `Bearer ` prefix).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSession {
    pub user: Option<AppUser>,
    pub token: Option<String>,
}

impl AuthSession {
    /// A stored user that no longer parses is dropped from the store.
    pub fn restore(store: &KvStore) -> Result<Self> {
        let user = match store.get_raw(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<AppUser>(&raw) {
                Ok(user) => Some(user),
                Err(_) => {
                    store
                        .remove(USER_KEY)
                        .context("dropping corrupt stored user")?;
                    None
                }
            },
            None => None,
        };
        let token = store.get_raw(TOKEN_KEY)?.filter(|t| !t.is_empty());
        Ok(Self { user, token })
    }

    pub fn login(&mut self, store: &KvStore, user: AppUser, token: String) -> Result<()> {
        store.set_raw(TOKEN_KEY, &token)?;
        store.set_json(USER_KEY, &user)?;
        self.user = Some(user);
        self.token = Some(token);
        Ok(())
    }

    pub fn logout(&mut self, store: &KvStore) -> Result<()> {
        self.user = None;
        self.token = None;
        store.remove(TOKEN_KEY)?;
        store.remove(USER_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role == UserRole::Admin)
    }
}

//! Login state for one viewer.
//!
//! There is exactly one account. The password is never stored; only its
//! SHA-256 digest is compared.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), user: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Returns whether the credentials were accepted. A failed attempt
    /// leaves an existing login untouched.
    pub fn login(&mut self, auth: &AuthConfig, username: &str, password: &str) -> bool {
        if username != auth.username || password_digest(password) != auth.password_sha256 {
            log::warn!("session {}: rejected login for '{username}'", self.id);
            return false;
        }
        log::info!("session {}: '{username}' logged in", self.id);
        self.user = Some(username.to_string());
        true
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            log::info!("session {}: '{user}' logged out", self.id);
        }
    }
}

/// Lowercase hex SHA-256 of a password.
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

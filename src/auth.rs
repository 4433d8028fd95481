//! User accounts and bearer-token sessions.
//!
//! Users live in `users.json`. Passwords are stored as a SHA-256 digest of a
//! per-user random salt followed by the password. Session tokens are random,
//! expire after a configured time and resolve only to the user they were
//! issued to.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::{Store, StoreError};

const MIN_PASSWORD_LEN: usize = 8;

/// Stored account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// Account fields safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            created_at: u.created_at,
        }
    }
}

/// Errors that can occur during registration, login or token checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password.
    InvalidCredentials,
    /// The username is already registered.
    UserExists(String),
    /// Username or password do not meet the requirements.
    InvalidInput(String),
    /// Missing, unknown, revoked or expired token.
    Unauthorized,
    Store(StoreError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid username or password"),
            AuthError::UserExists(name) => write!(f, "user {name:?} already exists"),
            AuthError::InvalidInput(msg) => write!(f, "{msg}"),
            AuthError::Unauthorized => write!(f, "missing or invalid session token"),
            AuthError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e)
    }
}

/// A live session bound to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Storage backend for sessions.
pub trait SessionStore: Send {
    fn save_session(&mut self, token: &str, session: Session);
    fn get_session(&self, token: &str) -> Option<Session>;
    /// Removes the session; returns whether it existed.
    fn revoke(&mut self, token: &str) -> bool;
    /// Drops every session that expired at or before `now`; returns how many.
    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize;
}

/// In-memory session storage; sessions end when the process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: HashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save_session(&mut self, token: &str, session: Session) {
        self.sessions.insert(token.to_string(), session);
    }

    fn get_session(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).cloned()
    }

    fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }
}

/// Hex SHA-256 of `salt` followed by `password`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn new_salt() -> String {
    BASE64.encode(rand::random::<[u8; 16]>())
}

fn new_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// Registers users and manages their sessions.
pub struct AuthService {
    users: Box<dyn Store<Vec<User>>>,
    sessions: Box<dyn SessionStore>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: impl Store<Vec<User>> + 'static,
        sessions: impl SessionStore + 'static,
        ttl: Duration,
    ) -> Self {
        Self {
            users: Box::new(users),
            sessions: Box::new(sessions),
            ttl,
        }
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<PublicUser, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidInput("username must not be empty".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let mut users = self.users.load()?;
        if users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(AuthError::UserExists(username.to_string()));
        }
        let salt = new_salt();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.users.save(&users)?;
        info!(user = %user.id, "user registered");
        Ok(PublicUser::from(&user))
    }

    /// Checks the credentials and issues a new session token.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(String, PublicUser), AuthError> {
        let users = self.users.load()?;
        let Some(user) = users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
        else {
            warn!("login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        let computed = hash_password(password, &user.salt);
        if !constant_time_eq(computed.as_bytes(), user.password_hash.as_bytes()) {
            warn!(user = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        let now = Utc::now();
        let purged = self.sessions.purge_expired(now);
        if purged > 0 {
            debug!(purged, "expired sessions dropped");
        }
        let token = new_token();
        self.sessions.save_session(
            &token,
            Session {
                user_id: user.id,
                expires_at: now + self.ttl,
            },
        );
        info!(user = %user.id, "session opened");
        Ok((token, PublicUser::from(user)))
    }

    /// Resolves a bearer token to the user it was issued to.
    pub fn authenticate(&mut self, token: &str) -> Result<PublicUser, AuthError> {
        let session = self
            .sessions
            .get_session(token)
            .ok_or(AuthError::Unauthorized)?;
        if session.expires_at <= Utc::now() {
            self.sessions.revoke(token);
            return Err(AuthError::Unauthorized);
        }
        let users = self.users.load()?;
        users
            .iter()
            .find(|u| u.id == session.user_id)
            .map(PublicUser::from)
            .ok_or(AuthError::Unauthorized)
    }

    pub fn logout(&mut self, token: &str) -> Result<(), AuthError> {
        if self.sessions.revoke(token) {
            info!("session closed");
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_depends_on_salt() {
        let a = hash_password("password1", "salt-a");
        let b = hash_password("password1", "salt-b");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_password("password1", "salt-a"));
    }

    #[test]
    fn constant_time_eq_checks_length_and_bytes() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_token(), new_token());
    }
}

//! Resolving the acting user of a request
//!
//! The core only needs "who is asking"; [`IdentityResolver`] is the seam. The
//! bundled [`SessionResolver`] follows a session token to a username and the
//! username to a stored user record.
use super::entities::User;
use super::error::{BookingError, Result};
use super::store::{decode, encode};
use super::types::{Audit, Role};
use super::utils::{self, hrp};
use sled::{Db, Tree};
use std::sync::Arc;

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// What the surrounding service extracted from the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session_token: Option<String>,
}

impl RequestContext {
    pub fn with_session(token: impl Into<String>) -> Self {
        Self {
            session_token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

pub trait IdentityResolver: Send + Sync {
    fn resolve_current_actor(&self, ctx: &RequestContext) -> Result<Actor>;
}

pub struct SessionResolver {
    users: Tree,    // username -> User
    sessions: Tree, // token -> username
}

impl SessionResolver {
    pub fn new(db: Arc<Db>) -> Result<Self> {
        Ok(Self {
            users: db.open_tree("users")?,
            sessions: db.open_tree("sessions")?,
        })
    }

    pub fn register_user(&self, username: &str, role: Role) -> Result<User> {
        if username.trim().is_empty() {
            return Err(BookingError::Validation("username is empty".into()));
        }
        if self.users.contains_key(username.as_bytes())? {
            return Err(BookingError::Validation(format!(
                "username {username} is taken"
            )));
        }

        let user = User {
            id: utils::new_uuid_to_bech32(hrp::USER)?,
            username: username.to_string(),
            role,
            audit: Audit::new(username),
        };
        self.users.insert(username.as_bytes(), encode(&user)?)?;

        Ok(user)
    }

    /// Start a session for `username` and return its token.
    pub fn open_session(&self, username: &str) -> Result<String> {
        if !self.users.contains_key(username.as_bytes())? {
            return Err(BookingError::not_found("user", username));
        }
        let token = utils::new_uuid_to_bech32(hrp::SESSION)?;
        self.sessions.insert(token.as_bytes(), username.as_bytes())?;
        Ok(token)
    }

    pub fn close_session(&self, token: &str) -> Result<()> {
        self.sessions.remove(token.as_bytes())?;
        Ok(())
    }
}

impl IdentityResolver for SessionResolver {
    fn resolve_current_actor(&self, ctx: &RequestContext) -> Result<Actor> {
        let token = ctx
            .session_token
            .as_deref()
            .ok_or_else(|| BookingError::Authentication("no session".into()))?;

        let username = self
            .sessions
            .get(token.as_bytes())?
            .ok_or_else(|| BookingError::Authentication("unknown session".into()))?;

        let user: User = match self.users.get(&username)? {
            Some(bytes) => decode(&bytes)?,
            None => {
                return Err(BookingError::Authentication(format!(
                    "session user {} no longer exists",
                    String::from_utf8_lossy(&username)
                )));
            }
        };

        if !user.audit.is_active {
            return Err(BookingError::Authentication(format!(
                "user {} is inactive",
                user.username
            )));
        }

        Ok(Actor::from(&user))
    }
}

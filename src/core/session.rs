//! Accounts and the login session
//!
//! The logged-in user is an explicit [`Session`] persisted under the project
//! state directory. Commands that act on a user's batches require one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::core::project::Project;
use crate::core::store::{Storage, StoreError};
use crate::entities::account::Account;
use crate::yaml::{parse_yaml_file, write_yaml_file, YamlError};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateAccount(name) => AccountError::UsernameTaken(name),
            other => AccountError::Store(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Run 'difftrack account login' first.")]
    NotLoggedIn,

    #[error(transparent)]
    Yaml(#[from] YamlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The user currently working in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in_at: Utc::now(),
        }
    }

    pub fn save(&self, project: &Project) -> Result<(), SessionError> {
        write_yaml_file(&project.session_path(), self)?;
        Ok(())
    }

    /// The saved session, if any
    pub fn load(project: &Project) -> Result<Option<Self>, SessionError> {
        let path = project.session_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(parse_yaml_file(&path)?))
    }

    /// The saved session, or [`SessionError::NotLoggedIn`]
    pub fn require(project: &Project) -> Result<Self, SessionError> {
        Self::load(project)?.ok_or(SessionError::NotLoggedIn)
    }

    /// Remove the saved session; returns whether one existed
    pub fn clear(project: &Project) -> Result<bool, SessionError> {
        let path = project.session_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Register a new account
pub fn create_account(
    store: &mut dyn Storage,
    username: &str,
    password: &str,
) -> Result<Account, AccountError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AccountError::EmptyUsername);
    }
    if password.is_empty() {
        return Err(AccountError::EmptyPassword);
    }

    let account = Account::new(username, password);
    store.write_account(&account)?;
    info!(user = %username, "created account");
    Ok(account)
}

/// Check credentials and open a session
pub fn login(store: &dyn Storage, username: &str, password: &str) -> Result<Session, AccountError> {
    let username = username.trim();
    match store.find_account(username)? {
        Some(account) if account.verify(password) => {
            info!(user = %username, "logged in");
            Ok(Session::new(username))
        }
        _ => Err(AccountError::InvalidCredentials),
    }
}

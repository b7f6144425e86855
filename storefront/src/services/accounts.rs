// storefront/src/services/accounts.rs

//! User accounts: registration, sign-in, and the bootstrap admin.

use crate::config::AdminAccount;
use crate::errors::{AppError, Result};
use crate::models::{NewUser, Role, User};
use crate::store::StoreTx;
use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    SaltString,
  },
  Argon2,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use txflow::{UnitOfWork, UnitSource};
use uuid::Uuid;

/// Hashes a plain-text password using Argon2 with default parameters.
#[instrument(name = "accounts::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed successfully.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// `Ok(false)` means the password is wrong; errors mean the stored hash is
/// unusable.
#[instrument(
  name = "accounts::verify_password",
  skip(hashed_password_str, provided_password),
  err(Display),
  fields(hash_len = hashed_password_str.len())
)]
pub fn verify_password(hashed_password_str: &str, provided_password: &str) -> Result<bool> {
  if hashed_password_str.is_empty() {
    return Err(AppError::Auth("Invalid stored password format (empty).".to_string()));
  }
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(hashed_password_str).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

pub struct AccountService<S> {
  source: Arc<S>,
}

impl<S> Clone for AccountService<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
    }
  }
}

const BAD_CREDENTIALS: &str = "Invalid username or password.";

impl<S> AccountService<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub fn new(source: Arc<S>) -> Self {
    Self { source }
  }

  #[instrument(name = "accounts::register", skip(self, input), fields(username = %input.username), err(Display))]
  pub async fn register(&self, input: NewUser) -> Result<User> {
    let username = input.username.trim();
    let email = input.email.trim();
    if username.is_empty() || email.is_empty() {
      return Err(AppError::Validation("Username and email are required.".to_string()));
    }
    if input.password != input.confirm_password {
      return Err(AppError::Validation("Passwords do not match.".to_string()));
    }
    // Hash before the transaction opens; it is the slow part.
    let password_hash = hash_password(&input.password)?;
    let user = self.insert_user(username, email, password_hash, Role::User).await?;
    info!(user_id = %user.id, "User registered.");
    Ok(user)
  }

  #[instrument(name = "accounts::authenticate", skip(self, password), err(Display))]
  pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
    let mut tx = self.source.begin().await?;
    let user = tx.user_by_username(username.trim()).await?;
    tx.commit().await?;

    let Some(user) = user else {
      warn!("Sign-in failed: unknown username.");
      return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
    };
    if !verify_password(&user.password_hash, password)? {
      warn!(user_id = %user.id, "Sign-in failed: wrong password.");
      return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
    }
    info!(user_id = %user.id, "User signed in.");
    Ok(user)
  }

  /// Creates the configured admin unless an admin already exists. Returns
  /// whether one was created.
  #[instrument(name = "accounts::ensure_default_admin", skip_all, fields(username = %admin.username), err(Display))]
  pub async fn ensure_default_admin(&self, admin: &AdminAccount) -> Result<bool> {
    if self.admin_count().await? > 0 {
      debug!("An admin account already exists.");
      return Ok(false);
    }
    let password_hash = hash_password(&admin.password)?;

    let mut tx = self.source.begin().await?;
    // Another instance may have created one while the password was hashed.
    if tx.count_admins().await? > 0 {
      return Ok(false);
    }
    let user = new_user(&admin.username, &admin.email, password_hash, Role::Admin);
    tx.insert_user(&user).await?;
    tx.commit().await?;
    info!(user_id = %user.id, "Default admin account created.");
    Ok(true)
  }

  pub async fn list_users(&self) -> Result<Vec<User>> {
    let mut tx = self.source.begin().await?;
    let users = tx.list_users().await?;
    tx.commit().await?;
    Ok(users)
  }

  async fn admin_count(&self) -> Result<i64> {
    let mut tx = self.source.begin().await?;
    let count = tx.count_admins().await?;
    tx.commit().await?;
    Ok(count)
  }

  async fn insert_user(&self, username: &str, email: &str, password_hash: String, role: Role) -> Result<User> {
    let mut tx = self.source.begin().await?;
    if tx.user_by_username(username).await?.is_some() {
      return Err(AppError::Validation(format!("Username '{}' is already taken.", username)));
    }
    if tx.user_by_email(email).await?.is_some() {
      return Err(AppError::Validation(format!("Email '{}' is already registered.", email)));
    }
    let user = new_user(username, email, password_hash, role);
    tx.insert_user(&user).await?;
    tx.commit().await?;
    Ok(user)
  }
}

fn new_user(username: &str, email: &str, password_hash: String, role: Role) -> User {
  User {
    id: Uuid::new_v4(),
    username: username.to_string(),
    email: email.to_string(),
    password_hash,
    role,
    created_at: Utc::now(),
  }
}

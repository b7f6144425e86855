// storefront/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
  type Err = UnknownRole;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "admin" => Ok(Role::Admin),
      other => Err(UnknownRole(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: Uuid,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

/// Row shape of the `users` table; the role is stored as text.
#[derive(Debug, FromRow)]
pub struct UserRow {
  pub id: Uuid,
  pub username: String,
  pub email: String,
  pub password_hash: String,
  pub role: String,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
  type Error = UnknownRole;

  fn try_from(row: UserRow) -> Result<Self, Self::Error> {
    Ok(User {
      id: row.id,
      username: row.username,
      email: row.email,
      password_hash: row.password_hash,
      role: row.role.parse()?,
      created_at: row.created_at,
    })
  }
}

/// Sign-up input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
}

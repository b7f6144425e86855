// storefront/src/models/feedback.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub food_quality: i32,
  pub service: i32,
  pub comments: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFeedback {
  pub name: String,
  pub email: String,
  pub food_quality: i32,
  pub service: i32,
  pub comments: Option<String>,
}

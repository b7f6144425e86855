// storefront/src/services/feedback.rs

use crate::errors::{AppError, Result};
use crate::models::{Feedback, NewFeedback};
use crate::store::StoreTx;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use txflow::{UnitOfWork, UnitSource};
use uuid::Uuid;

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

pub struct FeedbackService<S> {
  source: Arc<S>,
}

impl<S> Clone for FeedbackService<S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
    }
  }
}

fn validate(input: &NewFeedback) -> Result<()> {
  if input.name.trim().is_empty() || input.email.trim().is_empty() {
    return Err(AppError::Validation("Name and email are required.".to_string()));
  }
  if !input.email.contains('@') {
    return Err(AppError::Validation(format!("'{}' is not an email address.", input.email)));
  }
  for (field, rating) in [("food_quality", input.food_quality), ("service", input.service)] {
    if !RATING_RANGE.contains(&rating) {
      return Err(AppError::Validation(format!(
        "Rating '{}' must be between 1 and 5, got {}.",
        field, rating
      )));
    }
  }
  Ok(())
}

impl<S> FeedbackService<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub fn new(source: Arc<S>) -> Self {
    Self { source }
  }

  #[instrument(name = "feedback::submit", skip_all, err(Display))]
  pub async fn submit(&self, input: NewFeedback) -> Result<Feedback> {
    validate(&input)?;
    let feedback = Feedback {
      id: Uuid::new_v4(),
      name: input.name.trim().to_string(),
      email: input.email.trim().to_string(),
      food_quality: input.food_quality,
      service: input.service,
      comments: input.comments.filter(|c| !c.trim().is_empty()),
      created_at: Utc::now(),
    };

    let mut tx = self.source.begin().await?;
    tx.insert_feedback(&feedback).await?;
    tx.commit().await?;
    info!(feedback_id = %feedback.id, "Feedback recorded.");
    Ok(feedback)
  }

  /// All feedback, newest first.
  pub async fn list(&self) -> Result<Vec<Feedback>> {
    let mut tx = self.source.begin().await?;
    let feedback = tx.list_feedback().await?;
    tx.commit().await?;
    Ok(feedback)
  }
}

// tests/feedback_tests.rs
mod common;

use common::*;
use storefront::models::NewFeedback;
use storefront::AppError;

fn feedback(name: &str, food_quality: i32, service: i32) -> NewFeedback {
  NewFeedback {
    name: name.to_string(),
    email: format!("{}@example.com", name.to_lowercase()),
    food_quality,
    service,
    comments: Some("Lovely".to_string()),
  }
}

#[tokio::test]
async fn test_feedback_is_listed_newest_first() {
  let app = memory_app();
  app.state.feedback.submit(feedback("Ada", 5, 4)).await.unwrap();
  app.state.feedback.submit(feedback("Grace", 3, 5)).await.unwrap();

  let listed = app.state.feedback.list().await.unwrap();
  let names: Vec<&str> = listed.iter().map(|f| f.name.as_str()).collect();
  assert_eq!(names, vec!["Grace", "Ada"]);
  assert_eq!(listed[1].email, "ada@example.com");
}

#[tokio::test]
async fn test_feedback_ratings_must_be_one_to_five() {
  let app = memory_app();
  for (food, service) in [(0, 3), (6, 3), (3, 0), (3, 6)] {
    let err = app.state.feedback.submit(feedback("Bob", food, service)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  }
  assert!(app.state.feedback.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_feedback_requires_name_and_email() {
  let app = memory_app();
  let mut missing_name = feedback("Eve", 4, 4);
  missing_name.name = " ".to_string();
  let mut bad_email = feedback("Eve", 4, 4);
  bad_email.email = "not-an-email".to_string();

  for input in [missing_name, bad_email] {
    let err = app.state.feedback.submit(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
  }
}

#[tokio::test]
async fn test_blank_comments_are_dropped() {
  let app = memory_app();
  let mut input = feedback("Lin", 4, 4);
  input.comments = Some("   ".to_string());
  let stored = app.state.feedback.submit(input).await.unwrap();
  assert_eq!(stored.comments, None);
}

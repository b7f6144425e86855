// storefront/src/state.rs

use crate::config::AppConfig;
use crate::engine::CartEngine;
use crate::services::{AccountService, CatalogService, FeedbackService};
use crate::store::StoreTx;
use std::sync::Arc;
use txflow::UnitSource;

/// Everything a request needs, sharing one store.
pub struct AppState<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub store: Arc<S>,
  pub engine: CartEngine<S>,
  pub catalog: CatalogService<S>,
  pub feedback: FeedbackService<S>,
  pub accounts: AccountService<S>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl<S> AppState<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  pub fn new(store: Arc<S>, config: Arc<AppConfig>) -> Self {
    Self {
      engine: CartEngine::new(Arc::clone(&store)),
      catalog: CatalogService::new(Arc::clone(&store)),
      feedback: FeedbackService::new(Arc::clone(&store)),
      accounts: AccountService::new(Arc::clone(&store)),
      store,
      config,
    }
  }
}

impl<S> Clone for AppState<S>
where
  S: UnitSource,
  S::Unit: StoreTx,
{
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      engine: self.engine.clone(),
      catalog: self.catalog.clone(),
      feedback: self.feedback.clone(),
      accounts: self.accounts.clone(),
      config: Arc::clone(&self.config),
    }
  }
}

// storefront/src/lib.rs

//! Storefront backend: catalog, accounts, feedback, and the cart transaction
//! engine that keeps cart reservations and product stock consistent.
//!
//! Cart mutations are `txflow` pipelines. Each run executes inside one storage
//! transaction, so stock and cart contents always change together.

pub mod cart_store;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod pipelines;
pub mod projections;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

pub use engine::CartEngine;
pub use errors::{AppError, Result};
pub use state::AppState;
pub use store::{MemoryStore, PgStore, StoreError, StoreTx};

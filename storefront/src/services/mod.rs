// storefront/src/services/mod.rs

//! Storefront services that sit beside the cart engine. Each public operation
//! runs in its own storage transaction.

pub mod accounts;
pub mod catalog;
pub mod feedback;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use feedback::FeedbackService;

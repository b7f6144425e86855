// storefront/src/models/mod.rs

//! Contains data structures representing database entities.

pub mod cart;
pub mod cart_item;
pub mod feedback;
pub mod product;
pub mod user;

// Re-export the model structs for convenient access
pub use cart::{Cart, CartView, ClearOutcome, PricedLine};
pub use cart_item::{CartItem, CartLine};
pub use feedback::{Feedback, NewFeedback};
pub use product::{Product, ProductDraft, StockSummary};
pub use user::{NewUser, Role, User, UserRow};

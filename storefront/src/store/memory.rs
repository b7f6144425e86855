// storefront/src/store/memory.rs

//! In-process transactional store.
//!
//! `begin` takes a store-wide async lock and copies the tables; the transaction
//! works on its copy, `commit` publishes it and dropping the transaction throws
//! it away. Transactions are therefore fully serialized, which gives the same
//! guarantees the Postgres store gets from row locks.
//!
//! Row locks are still tracked per transaction: a lock requested out of the
//! global order (cart, products by ascending id, cart items) fails with
//! `StoreError::LockOrder`. That order is what keeps concurrent Postgres
//! transactions free of deadlocks, and the serialized store would hide a
//! violation otherwise.

use super::{StoreError, StoreResult, StoreTx};
use crate::models::{Cart, CartItem, CartLine, Feedback, Product, Role, User};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};
use txflow::{UnitOfWork, UnitSource};
use uuid::Uuid;

/// Places where an armed failure is injected. Each armed point fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
  /// `set_stock`
  StockWrite,
  /// Any cart item insert, update, or delete.
  CartItemWrite,
  /// `commit`
  Commit,
}

/// A row a transaction holds a lock on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowLock {
  Cart(Uuid),
  Product(Uuid),
  CartItem(Uuid),
}

impl RowLock {
  fn rank(self) -> u8 {
    match self {
      RowLock::Cart(_) => 0,
      RowLock::Product(_) => 1,
      RowLock::CartItem(_) => 2,
    }
  }

  /// Whether taking `self` while holding `held` respects the global order.
  fn may_follow(self, held: RowLock) -> bool {
    match (held, self) {
      (RowLock::Product(a), RowLock::Product(b)) => b > a,
      _ => self.rank() >= held.rank(),
    }
  }
}

#[derive(Debug, Clone, Default)]
struct Tables {
  products: BTreeMap<Uuid, Product>,
  carts: BTreeMap<Uuid, Cart>,
  cart_items: BTreeMap<Uuid, CartItem>,
  feedback: Vec<Feedback>,
  users: BTreeMap<Uuid, User>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  tables: Arc<AsyncMutex<Tables>>,
  armed: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the next transaction that reaches `point` fail there with
  /// `StoreError::Unavailable`.
  pub fn fail_next(&self, point: FailPoint) {
    self.armed.lock().insert(point);
  }

  pub fn disarm_all(&self) {
    self.armed.lock().clear();
  }
}

#[async_trait]
impl UnitSource for MemoryStore {
  type Unit = MemoryTx;

  async fn begin(&self) -> StoreResult<MemoryTx> {
    let guard = Arc::clone(&self.tables).lock_owned().await;
    let working = guard.clone();
    Ok(MemoryTx {
      guard,
      working,
      held: Vec::new(),
      armed: Arc::clone(&self.armed),
    })
  }
}

pub struct MemoryTx {
  guard: OwnedMutexGuard<Tables>,
  working: Tables,
  held: Vec<RowLock>,
  armed: Arc<Mutex<HashSet<FailPoint>>>,
}

impl MemoryTx {
  fn lock_row(&mut self, row: RowLock) -> StoreResult<()> {
    if self.held.contains(&row) {
      return Ok(());
    }
    if let Some(blocking) = self.held.iter().copied().find(|held| !row.may_follow(*held)) {
      warn!(?row, ?blocking, "Row lock requested out of order.");
      return Err(StoreError::LockOrder(format!("{:?} requested while holding {:?}", row, blocking)));
    }
    self.held.push(row);
    Ok(())
  }

  fn lock_items(&mut self, items: &[CartItem]) -> StoreResult<()> {
    items.iter().try_for_each(|item| self.lock_row(RowLock::CartItem(item.id)))
  }

  fn trip(&self, point: FailPoint) -> StoreResult<()> {
    if self.armed.lock().remove(&point) {
      warn!(?point, "Injected store failure.");
      return Err(StoreError::Unavailable(format!("injected failure at {:?}", point)));
    }
    Ok(())
  }

  fn line_for(&self, item: &CartItem) -> Option<CartLine> {
    self.working.products.get(&item.product_id).map(|p| CartLine {
      item_id: item.id,
      product_id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      image_url: p.image_url.clone(),
      quantity: item.quantity,
    })
  }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
  type Error = StoreError;

  async fn commit(self) -> StoreResult<()> {
    self.trip(FailPoint::Commit)?;
    let MemoryTx { mut guard, working, .. } = self;
    *guard = working;
    debug!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(self) -> StoreResult<()> {
    debug!("Memory transaction rolled back.");
    Ok(())
  }
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn insert_product(&mut self, product: &Product) -> StoreResult<()> {
    if self.working.products.contains_key(&product.id) {
      return Err(StoreError::Conflict(format!("product {} already exists", product.id)));
    }
    self.working.products.insert(product.id, product.clone());
    Ok(())
  }

  async fn update_product(&mut self, product: &Product) -> StoreResult<bool> {
    match self.working.products.get_mut(&product.id) {
      Some(existing) => {
        let created_at = existing.created_at;
        *existing = Product {
          created_at,
          ..product.clone()
        };
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool> {
    if self.working.products.remove(&product_id).is_none() {
      return Ok(false);
    }
    self.working.cart_items.retain(|_, item| item.product_id != product_id);
    Ok(true)
  }

  async fn product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>> {
    Ok(self.working.products.get(&product_id).cloned())
  }

  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    let mut products: Vec<Product> = self.working.products.values().cloned().collect();
    products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
    Ok(products)
  }

  async fn stock_for_update(&mut self, product_id: Uuid) -> StoreResult<Option<i32>> {
    let stock = self.working.products.get(&product_id).map(|p| p.stock);
    if stock.is_some() {
      self.lock_row(RowLock::Product(product_id))?;
    }
    Ok(stock)
  }

  async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> StoreResult<()> {
    self.trip(FailPoint::StockWrite)?;
    if stock < 0 {
      // Mirrors the CHECK constraint of the SQL schema.
      return Err(StoreError::Constraint(format!("stock of product {} would become {}", product_id, stock)));
    }
    if self.working.products.contains_key(&product_id) {
      self.lock_row(RowLock::Product(product_id))?;
    }
    if let Some(product) = self.working.products.get_mut(&product_id) {
      product.stock = stock;
      product.updated_at = chrono::Utc::now();
    }
    Ok(())
  }

  async fn reserved_quantity(&mut self, product_id: Uuid) -> StoreResult<i64> {
    Ok(
      self
        .working
        .cart_items
        .values()
        .filter(|item| item.product_id == product_id)
        .map(|item| i64::from(item.quantity))
        .sum(),
    )
  }

  async fn cart(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>> {
    Ok(self.working.carts.get(&cart_id).cloned())
  }

  async fn cart_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Cart>> {
    Ok(self.working.carts.values().find(|c| c.user_id == user_id).cloned())
  }

  async fn cart_for_update(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>> {
    let cart = self.working.carts.get(&cart_id).cloned();
    if cart.is_some() {
      self.lock_row(RowLock::Cart(cart_id))?;
    }
    Ok(cart)
  }

  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<()> {
    if !self.working.carts.values().any(|c| c.user_id == cart.user_id) {
      self.working.carts.insert(cart.id, cart.clone());
    }
    Ok(())
  }

  async fn cart_item(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    Ok(self.working.cart_items.get(&item_id).cloned())
  }

  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let mut items: Vec<CartItem> = self.working.cart_items.values().filter(|item| item.cart_id == cart_id).cloned().collect();
    items.sort_by_key(|item| item.product_id);
    Ok(items)
  }

  async fn cart_item_for_update(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = self.working.cart_items.get(&item_id).cloned();
    if let Some(item) = &item {
      self.lock_row(RowLock::CartItem(item.id))?;
    }
    Ok(item)
  }

  async fn cart_item_by_product_for_update(&mut self, cart_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = self
      .working
      .cart_items
      .values()
      .find(|item| item.cart_id == cart_id && item.product_id == product_id)
      .cloned();
    if let Some(item) = &item {
      self.lock_row(RowLock::CartItem(item.id))?;
    }
    Ok(item)
  }

  async fn cart_items_for_update(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let items = self.cart_items(cart_id).await?;
    self.lock_items(&items)?;
    Ok(items)
  }

  async fn cart_lines(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let mut lines: Vec<CartLine> = self
      .working
      .cart_items
      .values()
      .filter(|item| item.cart_id == cart_id)
      .filter_map(|item| self.line_for(item))
      .collect();
    lines.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.item_id.cmp(&b.item_id)));
    Ok(lines)
  }

  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
    self.trip(FailPoint::CartItemWrite)?;
    let duplicate = self
      .working
      .cart_items
      .values()
      .any(|existing| existing.cart_id == item.cart_id && existing.product_id == item.product_id);
    if duplicate {
      return Err(StoreError::Conflict(format!(
        "cart {} already holds product {}",
        item.cart_id, item.product_id
      )));
    }
    self.working.cart_items.insert(item.id, item.clone());
    Ok(())
  }

  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: i32) -> StoreResult<()> {
    self.trip(FailPoint::CartItemWrite)?;
    if self.working.cart_items.contains_key(&item_id) {
      self.lock_row(RowLock::CartItem(item_id))?;
    }
    if let Some(item) = self.working.cart_items.get_mut(&item_id) {
      item.quantity = quantity;
    }
    Ok(())
  }

  async fn delete_cart_item(&mut self, item_id: Uuid) -> StoreResult<bool> {
    self.trip(FailPoint::CartItemWrite)?;
    if self.working.cart_items.contains_key(&item_id) {
      self.lock_row(RowLock::CartItem(item_id))?;
    }
    Ok(self.working.cart_items.remove(&item_id).is_some())
  }

  async fn delete_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64> {
    self.trip(FailPoint::CartItemWrite)?;
    let doomed = self.cart_items(cart_id).await?;
    self.lock_items(&doomed)?;
    let before = self.working.cart_items.len();
    self.working.cart_items.retain(|_, item| item.cart_id != cart_id);
    Ok((before - self.working.cart_items.len()) as u64)
  }

  async fn insert_feedback(&mut self, feedback: &Feedback) -> StoreResult<()> {
    self.working.feedback.push(feedback.clone());
    Ok(())
  }

  async fn list_feedback(&mut self) -> StoreResult<Vec<Feedback>> {
    Ok(self.working.feedback.iter().rev().cloned().collect())
  }

  async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
    let taken = self
      .working
      .users
      .values()
      .any(|u| u.username == user.username || u.email == user.email);
    if taken {
      return Err(StoreError::Conflict(format!("username or email of '{}' already taken", user.username)));
    }
    self.working.users.insert(user.id, user.clone());
    Ok(())
  }

  async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
    Ok(self.working.users.values().find(|u| u.username == username).cloned())
  }

  async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    Ok(self.working.users.values().find(|u| u.email == email).cloned())
  }

  async fn list_users(&mut self) -> StoreResult<Vec<User>> {
    let mut users: Vec<User> = self.working.users.values().cloned().collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.username.cmp(&b.username)));
    Ok(users)
  }

  async fn count_admins(&mut self) -> StoreResult<i64> {
    Ok(self.working.users.values().filter(|u| u.role == Role::Admin).count() as i64)
  }
}

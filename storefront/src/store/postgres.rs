// storefront/src/store/postgres.rs

//! Postgres store. A `PgTx` is a plain sqlx transaction at READ COMMITTED;
//! the `*_for_update` reads take row locks with `SELECT ... FOR UPDATE`.

use super::{StoreError, StoreResult, StoreTx};
use crate::models::{Cart, CartItem, CartLine, Feedback, Product, User, UserRow};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, instrument};
use txflow::{UnitOfWork, UnitSource};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

const PRODUCT_COLUMNS: &str =
  "id, name, description, price_cents, image_url, category, stock, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

#[derive(Clone, Debug)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  #[instrument(name = "PgStore::connect", skip(database_url))]
  pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!("Connected to the database.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  /// Creates missing tables and indexes.
  #[instrument(name = "PgStore::apply_schema", skip(self))]
  pub async fn apply_schema(&self) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    info!("Database schema applied.");
    Ok(())
  }
}

#[async_trait]
impl UnitSource for PgStore {
  type Unit = PgTx;

  async fn begin(&self) -> StoreResult<PgTx> {
    let tx = self.pool.begin().await?;
    Ok(PgTx { tx })
  }
}

/// Dropping a `PgTx` without committing rolls the transaction back.
pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgTx {
  type Error = StoreError;

  async fn commit(self) -> StoreResult<()> {
    self.tx.commit().await?;
    debug!("Postgres transaction committed.");
    Ok(())
  }

  async fn rollback(self) -> StoreResult<()> {
    self.tx.rollback().await?;
    debug!("Postgres transaction rolled back.");
    Ok(())
  }
}

fn user_from_row(row: UserRow) -> StoreResult<User> {
  User::try_from(row).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl StoreTx for PgTx {
  async fn insert_product(&mut self, p: &Product) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, image_url, category, stock, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(p.id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.price_cents)
    .bind(&p.image_url)
    .bind(&p.category)
    .bind(p.stock)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn update_product(&mut self, p: &Product) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE products SET name = $2, description = $3, price_cents = $4, image_url = $5, \
       category = $6, stock = $7, updated_at = $8 WHERE id = $1",
    )
    .bind(p.id)
    .bind(&p.name)
    .bind(&p.description)
    .bind(p.price_cents)
    .bind(&p.image_url)
    .bind(&p.category)
    .bind(p.stock)
    .bind(p.updated_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn delete_product(&mut self, product_id: Uuid) -> StoreResult<bool> {
    // cart_items go with it through ON DELETE CASCADE
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(product_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn product(&mut self, product_id: Uuid) -> StoreResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
      .bind(product_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(product)
  }

  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY created_at, name", PRODUCT_COLUMNS);
    let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&mut *self.tx).await?;
    Ok(products)
  }

  async fn stock_for_update(&mut self, product_id: Uuid) -> StoreResult<Option<i32>> {
    let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
      .bind(product_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(stock)
  }

  async fn set_stock(&mut self, product_id: Uuid, stock: i32) -> StoreResult<()> {
    sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
      .bind(product_id)
      .bind(stock)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn reserved_quantity(&mut self, product_id: Uuid) -> StoreResult<i64> {
    let reserved =
      sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?;
    Ok(reserved)
  }

  async fn cart(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at FROM carts WHERE id = $1")
      .bind(cart_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(cart)
  }

  async fn cart_for_user(&mut self, user_id: Uuid) -> StoreResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(cart)
  }

  async fn cart_for_update(&mut self, cart_id: Uuid) -> StoreResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at FROM carts WHERE id = $1 FOR UPDATE")
      .bind(cart_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(cart)
  }

  async fn insert_cart_if_absent(&mut self, cart: &Cart) -> StoreResult<()> {
    sqlx::query("INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, $3) ON CONFLICT (user_id) DO NOTHING")
      .bind(cart.id)
      .bind(cart.user_id)
      .bind(cart.created_at)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn cart_item(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>("SELECT id, cart_id, product_id, quantity FROM cart_items WHERE id = $1")
      .bind(item_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(item)
  }

  async fn cart_items(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
      "SELECT id, cart_id, product_id, quantity FROM cart_items WHERE cart_id = $1 ORDER BY product_id",
    )
    .bind(cart_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(items)
  }

  async fn cart_item_for_update(&mut self, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
      "SELECT id, cart_id, product_id, quantity FROM cart_items WHERE id = $1 FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn cart_item_by_product_for_update(&mut self, cart_id: Uuid, product_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
      "SELECT id, cart_id, product_id, quantity FROM cart_items \
       WHERE cart_id = $1 AND product_id = $2 FOR UPDATE",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(item)
  }

  async fn cart_items_for_update(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartItem>> {
    let items = sqlx::query_as::<_, CartItem>(
      "SELECT id, cart_id, product_id, quantity FROM cart_items \
       WHERE cart_id = $1 ORDER BY product_id FOR UPDATE",
    )
    .bind(cart_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(items)
  }

  async fn cart_lines(&mut self, cart_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
      "SELECT ci.id AS item_id, p.id AS product_id, p.name, p.price_cents, p.image_url, ci.quantity \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.cart_id = $1 ORDER BY p.name, ci.id",
    )
    .bind(cart_id)
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(lines)
  }

  async fn insert_cart_item(&mut self, item: &CartItem) -> StoreResult<()> {
    sqlx::query("INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4)")
      .bind(item.id)
      .bind(item.cart_id)
      .bind(item.product_id)
      .bind(item.quantity)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn set_cart_item_quantity(&mut self, item_id: Uuid, quantity: i32) -> StoreResult<()> {
    sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
      .bind(item_id)
      .bind(quantity)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn delete_cart_item(&mut self, item_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
      .bind(item_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn delete_cart_items(&mut self, cart_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
      .bind(cart_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn insert_feedback(&mut self, f: &Feedback) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO feedback (id, name, email, food_quality, service, comments, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(f.id)
    .bind(&f.name)
    .bind(&f.email)
    .bind(f.food_quality)
    .bind(f.service)
    .bind(&f.comments)
    .bind(f.created_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn list_feedback(&mut self) -> StoreResult<Vec<Feedback>> {
    let feedback = sqlx::query_as::<_, Feedback>(
      "SELECT id, name, email, food_quality, service, comments, created_at \
       FROM feedback ORDER BY created_at DESC, id",
    )
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(feedback)
  }

  async fn insert_user(&mut self, u: &User) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO users (id, username, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(u.id)
    .bind(&u.username)
    .bind(&u.email)
    .bind(&u.password_hash)
    .bind(u.role.as_str())
    .bind(u.created_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn user_by_username(&mut self, username: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
      .bind(username)
      .fetch_optional(&mut *self.tx)
      .await?;
    row.map(user_from_row).transpose()
  }

  async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
      .bind(email)
      .fetch_optional(&mut *self.tx)
      .await?;
    row.map(user_from_row).transpose()
  }

  async fn list_users(&mut self) -> StoreResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY created_at, username", USER_COLUMNS);
    let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&mut *self.tx).await?;
    rows.into_iter().map(user_from_row).collect()
  }

  async fn count_admins(&mut self) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(count)
  }
}

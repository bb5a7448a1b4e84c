//! The order/inventory transaction.
//!
//! A checkout batch commits inside ONE `BEGIN IMMEDIATE` transaction: a
//! read-only pre-flight pass over every line item, then an order insert plus
//! a conditional stock decrement per item. The conditional update
//! (`... WHERE quantity >= requested`) is the compare-and-swap that makes
//! overselling impossible even if a second writer slipped between the read
//! and the write; the enclosing transaction makes the batch all-or-nothing.

use crate::{storage, ShopStore, StoreError};
use pluggin_model::{CustomerName, LineItem, Order, OrderStatus};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::fmt::{Display, Formatter};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    EmptyBatch,
    ProductNotFound {
        product_id: i64,
    },
    SoldOut {
        product_id: i64,
        name: String,
    },
    InsufficientStock {
        product_id: i64,
        name: String,
        available: u32,
        requested: u32,
    },
    Storage(StoreError),
}

impl Display for CheckoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBatch => write!(f, "items array is required and cannot be empty"),
            Self::ProductNotFound { product_id } => {
                write!(f, "product {product_id} not found")
            }
            Self::SoldOut { name, .. } => write!(f, "product \"{name}\" is sold out"),
            Self::InsufficientStock {
                name,
                available,
                requested,
                ..
            } => write!(
                f,
                "insufficient stock for \"{name}\": available {available}, requested {requested}"
            ),
            Self::Storage(e) => write!(f, "checkout write failed: {e}"),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

struct PreflightRow {
    name: String,
    quantity: u32,
    is_sold_out: bool,
}

fn preflight_row(conn: &Connection, product_id: i64) -> Result<Option<PreflightRow>, StoreError> {
    conn.query_row(
        "SELECT name, quantity, is_sold_out FROM products WHERE id = ?1",
        params![product_id],
        |row| {
            Ok(PreflightRow {
                name: row.get(0)?,
                quantity: row.get::<_, i64>(1)?.max(0) as u32,
                is_sold_out: row.get::<_, i64>(2)? != 0,
            })
        },
    )
    .optional()
    .map_err(storage)
}

/// Runs one checkout batch on an open connection. Synchronous on purpose:
/// the caller decides the blocking-pool and write-lock discipline.
pub(crate) fn run_checkout(
    conn: &mut Connection,
    items: &[LineItem],
    customer_name: &CustomerName,
    user_id: &str,
    now: i64,
) -> Result<Vec<Order>, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyBatch);
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(storage)?;

    // Pre-flight: every item is checked before anything is written, so a
    // failure on item N leaves items 1..N untouched by construction.
    for item in items {
        let product_id = item.product_id();
        let Some(row) = preflight_row(&tx, product_id)? else {
            return Err(CheckoutError::ProductNotFound { product_id });
        };
        if row.is_sold_out {
            return Err(CheckoutError::SoldOut {
                product_id,
                name: row.name,
            });
        }
        if row.quantity < item.quantity() {
            return Err(CheckoutError::InsufficientStock {
                product_id,
                name: row.name,
                available: row.quantity,
                requested: item.quantity(),
            });
        }
    }

    let mut orders = Vec::with_capacity(items.len());
    for item in items {
        let product_id = item.product_id();
        let requested = item.quantity();
        let total_price = item
            .total_price()
            .map_err(|e| CheckoutError::Storage(StoreError(e.to_string())))?;

        tx.execute(
            "INSERT INTO orders (product_id, quantity, total_price, customer_name, user_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product_id,
                i64::from(requested),
                total_price.minor_units(),
                customer_name.as_str(),
                user_id,
                OrderStatus::Pending.as_str(),
                now,
            ],
        )
        .map_err(storage)?;
        let order_id = tx.last_insert_rowid();

        // Conditional decrement. Affected-row count zero means the stock
        // moved underneath us (e.g. the same product appears twice in this
        // batch); the transaction rolls back on the error path.
        let affected = tx
            .execute(
                "UPDATE products
                 SET quantity = quantity - ?1,
                     is_sold_out = CASE WHEN quantity - ?1 <= 0 THEN 1 ELSE is_sold_out END
                 WHERE id = ?2 AND is_sold_out = 0 AND quantity >= ?1",
                params![i64::from(requested), product_id],
            )
            .map_err(storage)?;
        if affected == 0 {
            let row = preflight_row(&tx, product_id)?;
            let available = row.as_ref().map_or(0, |r| r.quantity);
            warn!(
                product_id,
                requested, available, "conditional stock decrement rejected; rolling back batch"
            );
            return Err(CheckoutError::InsufficientStock {
                product_id,
                name: row.map(|r| r.name).unwrap_or_default(),
                available,
                requested,
            });
        }

        orders.push(Order {
            id: order_id,
            product_id: Some(product_id),
            quantity: requested,
            total_price,
            customer_name: customer_name.as_str().to_string(),
            user_id: Some(user_id.to_string()),
            status: OrderStatus::Pending,
            created_at: now,
        });
    }

    tx.commit().map_err(storage)?;
    Ok(orders)
}

impl ShopStore {
    /// Commits a checkout batch: either every line item becomes an order
    /// with its stock decrement applied, or nothing is visible afterwards.
    ///
    /// On success each affected product's stock has dropped by exactly the
    /// requested quantity and `is_sold_out` has flipped on wherever stock
    /// reached zero.
    pub async fn commit_checkout(
        &self,
        items: Vec<LineItem>,
        customer_name: CustomerName,
        user_id: String,
    ) -> Result<Vec<Order>, CheckoutError> {
        let now = pluggin_core::unix_now_secs();
        let orders = self
            .write_with(move |conn| run_checkout(conn, &items, &customer_name, &user_id, now))
            .await?;
        info!(order_count = orders.len(), "checkout committed");
        Ok(orders)
    }
}

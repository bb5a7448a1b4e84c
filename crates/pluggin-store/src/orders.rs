use crate::{storage, ShopStore, StoreError};
use pluggin_model::{Order, OrderStatus, Price, ShippingAddress, ShippingAddressDraft};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use std::fmt::{Display, Formatter};
use tracing::info;

/// An order joined with its product's current name for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOrder {
    pub order: Order,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingError {
    OrderNotFound { order_id: i64 },
    AlreadyRecorded { order_id: i64 },
    Storage(StoreError),
}

impl Display for ShippingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderNotFound { order_id } => write!(f, "order {order_id} not found"),
            Self::AlreadyRecorded { order_id } => {
                write!(f, "order {order_id} already has a shipping address")
            }
            Self::Storage(e) => write!(f, "shipping address write failed: {e}"),
        }
    }
}

impl std::error::Error for ShippingError {}

impl From<StoreError> for ShippingError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

fn order_from_row(row: &Row<'_>) -> Result<Order, rusqlite::Error> {
    let quantity: i64 = row.get("quantity")?;
    let total_minor: i64 = row.get("total_price")?;
    let status: String = row.get("status")?;
    Ok(Order {
        id: row.get("id")?,
        product_id: row.get("product_id")?,
        quantity: quantity.max(0) as u32,
        total_price: Price::from_minor_units(total_minor.max(0)).unwrap_or_else(|_| Price::zero()),
        customer_name: row.get("customer_name")?,
        user_id: row.get("user_id")?,
        status: OrderStatus::parse(&status).unwrap_or(OrderStatus::Pending),
        created_at: row.get("created_at")?,
    })
}

impl ShopStore {
    /// Dashboard listing, newest first, with product names joined in.
    pub async fn list_orders(&self) -> Result<Vec<AdminOrder>, StoreError> {
        self.read(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT o.id, o.product_id, o.quantity, o.total_price, o.customer_name,
                            o.user_id, o.status, o.created_at, p.name AS product_name
                     FROM orders o LEFT JOIN products p ON p.id = o.product_id
                     ORDER BY o.created_at DESC, o.id DESC",
                )
                .map_err(storage)?;
            let rows = stmt
                .query_map([], |row| {
                    let order = order_from_row(row)?;
                    let product_name: Option<String> = row.get("product_name")?;
                    Ok(AdminOrder {
                        order,
                        product_name,
                    })
                })
                .map_err(storage)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(storage)?);
            }
            Ok(out)
        })
        .await
    }

    pub async fn get_order(&self, id: i64) -> Result<Option<Order>, StoreError> {
        self.read(move |conn| {
            conn.query_row(
                "SELECT id, product_id, quantity, total_price, customer_name, user_id, status, created_at
                 FROM orders WHERE id = ?1",
                params![id],
                |row| order_from_row(row),
            )
            .optional()
            .map_err(storage)
        })
        .await
    }

    /// Admin-only status transition. Returns `false` for an unknown order.
    pub async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        self.write(move |conn| {
            let affected = conn
                .execute(
                    "UPDATE orders SET status = ?1 WHERE id = ?2",
                    params![status.as_str(), id],
                )
                .map_err(storage)?;
            if affected > 0 {
                info!(order_id = id, status = status.as_str(), "order status updated");
            }
            Ok(affected > 0)
        })
        .await
    }

    /// Records the one shipping address an order gets. The existence check
    /// and the insert share an immediate transaction, so two submissions for
    /// the same order cannot both pass.
    pub async fn insert_shipping_address(
        &self,
        draft: ShippingAddressDraft,
    ) -> Result<ShippingAddress, ShippingError> {
        let now = pluggin_core::unix_now_secs();
        self.write_with(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage)?;
            let order_exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM orders WHERE id = ?1",
                    params![draft.order_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)?;
            if order_exists.is_none() {
                return Err(ShippingError::OrderNotFound {
                    order_id: draft.order_id,
                });
            }
            let taken: Option<i64> = tx
                .query_row(
                    "SELECT id FROM shipping_addresses WHERE order_id = ?1",
                    params![draft.order_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)?;
            if taken.is_some() {
                return Err(ShippingError::AlreadyRecorded {
                    order_id: draft.order_id,
                });
            }
            tx.execute(
                "INSERT INTO shipping_addresses (order_id, name, email, phone, address, city, zip_code, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    draft.order_id,
                    draft.name,
                    draft.email.as_str(),
                    draft.phone,
                    draft.address,
                    draft.city,
                    draft.zip_code,
                    now,
                ],
            )
            .map_err(storage)?;
            let id = tx.last_insert_rowid();
            tx.commit().map_err(storage)?;
            info!(order_id = draft.order_id, "shipping address recorded");
            Ok(ShippingAddress {
                id,
                order_id: draft.order_id,
                name: draft.name,
                email: draft.email,
                phone: draft.phone,
                address: draft.address,
                city: draft.city,
                zip_code: draft.zip_code,
                created_at: now,
            })
        })
        .await
    }
}

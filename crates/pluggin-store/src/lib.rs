#![forbid(unsafe_code)]

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;

mod accounts;
mod catalog;
mod checkout;
mod orders;
mod schema;

pub use accounts::SubscribeError;
pub use checkout::CheckoutError;
pub use orders::{AdminOrder, ShippingError};

pub const CRATE_NAME: &str = "pluggin-store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

pub(crate) fn storage<E: Display>(e: E) -> StoreError {
    StoreError(e.to_string())
}

/// Handle to the shop database.
///
/// Reads open short-lived connections on the blocking pool. Writes
/// additionally funnel through a single-permit semaphore and run inside
/// `BEGIN IMMEDIATE` transactions, so at most one writer touches the file at
/// a time and a failed batch rolls back as a unit.
pub struct ShopStore {
    path: PathBuf,
    write_gate: Arc<Semaphore>,
}

impl ShopStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Arc<Self>, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage)?;
            }
        }
        let bootstrap_path = path.clone();
        task::spawn_blocking(move || {
            let conn = open_connection(&bootstrap_path)?;
            schema::bootstrap(&conn)
        })
        .await
        .map_err(storage)??;
        Ok(Arc::new(Self {
            path,
            write_gate: Arc::new(Semaphore::new(1)),
        }))
    }

    /// Liveness probe used by `/readyz`: the database file is openable and
    /// answers a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.read(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(storage)
        })
        .await
    }

    pub(crate) async fn read<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let conn = open_connection(&path)?;
            op(&conn)
        })
        .await
        .map_err(storage)?
    }

    pub(crate) async fn write<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let _permit = self
            .write_gate
            .clone()
            .acquire_owned()
            .await
            .map_err(storage)?;
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = open_connection(&path)?;
            op(&mut conn)
        })
        .await
        .map_err(storage)?
    }

    /// Like [`ShopStore::write`] but for operations with their own error
    /// type; the checkout path needs its taxonomy to survive the bridge.
    pub(crate) async fn write_with<T, E, F>(&self, op: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: Send + From<StoreError> + 'static,
        F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
    {
        let _permit = self
            .write_gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| E::from(storage(e)))?;
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = open_connection(&path).map_err(E::from)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| E::from(storage(e)))?
    }
}

pub(crate) fn open_connection(path: &std::path::Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(storage)?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
    )
    .map_err(storage)?;
    Ok(conn)
}

#[cfg(test)]
mod checkout_tests;
#[cfg(test)]
mod store_tests;

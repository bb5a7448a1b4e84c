use crate::{storage, ShopStore, StoreError};
use pluggin_model::{Price, Product, ProductCategory, ProductDraft};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

pub(crate) fn product_from_row(row: &Row<'_>) -> Result<Product, rusqlite::Error> {
    let price_minor: i64 = row.get("price")?;
    let quantity: i64 = row.get("quantity")?;
    let discount: Option<i64> = row.get("discount_percentage")?;
    let category: Option<String> = row.get("category")?;
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        price: Price::from_minor_units(price_minor).unwrap_or_else(|_| Price::zero()),
        image: row.get("image")?,
        quantity: quantity.max(0) as u32,
        is_sold_out: row.get::<_, i64>("is_sold_out")? != 0,
        discount_percentage: discount.map(|d| d.clamp(0, 100) as u8),
        is_on_sale: row.get::<_, i64>("is_on_sale")? != 0,
        category: category.and_then(|c| ProductCategory::parse(&c).ok()),
        created_at: row.get("created_at")?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, price, image, quantity, is_sold_out, discount_percentage, is_on_sale, category, created_at";

pub(crate) fn fetch_product(
    conn: &Connection,
    id: i64,
) -> Result<Option<Product>, StoreError> {
    conn.query_row(
        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
        params![id],
        |row| product_from_row(row),
    )
    .optional()
    .map_err(storage)
}

impl ShopStore {
    /// Catalog listing, newest first, optionally narrowed to one category.
    pub async fn list_products(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, StoreError> {
        self.read(move |conn| {
            let mut out = Vec::new();
            match category {
                Some(cat) => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1
                             ORDER BY created_at DESC, id DESC"
                        ))
                        .map_err(storage)?;
                    let rows = stmt
                        .query_map(params![cat.as_str()], |row| product_from_row(row))
                        .map_err(storage)?;
                    for row in rows {
                        out.push(row.map_err(storage)?);
                    }
                }
                None => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {PRODUCT_COLUMNS} FROM products
                             ORDER BY created_at DESC, id DESC"
                        ))
                        .map_err(storage)?;
                    let rows = stmt
                        .query_map([], |row| product_from_row(row))
                        .map_err(storage)?;
                    for row in rows {
                        out.push(row.map_err(storage)?);
                    }
                }
            }
            Ok(out)
        })
        .await
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        self.read(move |conn| fetch_product(conn, id)).await
    }

    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let now = pluggin_core::unix_now_secs();
        self.write(move |conn| {
            conn.execute(
                "INSERT INTO products
                     (name, price, image, quantity, is_sold_out, discount_percentage, is_on_sale, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    draft.name,
                    draft.price.minor_units(),
                    draft.image,
                    i64::from(draft.quantity),
                    draft.sold_out(),
                    draft.discount_percentage.map(i64::from),
                    draft.is_on_sale,
                    draft.category.map(ProductCategory::as_str),
                    now,
                ],
            )
            .map_err(storage)?;
            let id = conn.last_insert_rowid();
            info!(product_id = id, name = %draft.name, "product created");
            fetch_product(conn, id)?
                .ok_or_else(|| StoreError("created product row missing".to_string()))
        })
        .await
    }

    /// Full replace of the mutable columns; `created_at` is preserved and
    /// the sold-out flag is re-derived so the stock invariant cannot be
    /// edited away.
    pub async fn update_product(
        &self,
        id: i64,
        draft: ProductDraft,
    ) -> Result<Option<Product>, StoreError> {
        self.write(move |conn| {
            let affected = conn
                .execute(
                    "UPDATE products SET
                         name = ?1, price = ?2, image = ?3, quantity = ?4,
                         is_sold_out = ?5, discount_percentage = ?6, is_on_sale = ?7, category = ?8
                     WHERE id = ?9",
                    params![
                        draft.name,
                        draft.price.minor_units(),
                        draft.image,
                        i64::from(draft.quantity),
                        draft.sold_out(),
                        draft.discount_percentage.map(i64::from),
                        draft.is_on_sale,
                        draft.category.map(ProductCategory::as_str),
                        id,
                    ],
                )
                .map_err(storage)?;
            if affected == 0 {
                return Ok(None);
            }
            info!(product_id = id, "product updated");
            fetch_product(conn, id)
        })
        .await
    }

    pub async fn delete_product(&self, id: i64) -> Result<bool, StoreError> {
        self.write(move |conn| {
            let affected = conn
                .execute("DELETE FROM products WHERE id = ?1", params![id])
                .map_err(storage)?;
            if affected > 0 {
                info!(product_id = id, "product deleted");
            }
            Ok(affected > 0)
        })
        .await
    }
}

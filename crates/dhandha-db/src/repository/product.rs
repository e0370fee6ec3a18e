//! # Product Repository
//!
//! Database operations for the inventory: CRUD, barcode lookup, and the
//! stock delta applied during a sale or a stock receipt.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dhandha_core::Product;

/// Column-shaped row, mapped explicitly onto the domain type.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    merchant_id: String,
    name: String,
    cost_price_paise: i64,
    selling_price_paise: i64,
    stock: i64,
    category: String,
    gst_bps: Option<u32>,
    barcode: Option<String>,
    image_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            merchant_id: row.merchant_id,
            name: row.name,
            cost_price_paise: row.cost_price_paise,
            selling_price_paise: row.selling_price_paise,
            stock: row.stock,
            category: row.category,
            gst_bps: row.gst_bps,
            barcode: row.barcode,
            image_ref: row.image_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, merchant_id, name, cost_price_paise, selling_price_paise, \
     stock, category, gst_bps, barcode, image_ref, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products for a merchant, sorted by name.
    pub async fn list(&self, merchant_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE merchant_id = ?1 ORDER BY name"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Resolves a scanned code against product ID or barcode.
    ///
    /// The scanner collaborator yields an opaque string; some shops print
    /// their own labels carrying the product ID, others use the
    /// manufacturer barcode.
    pub async fn get_by_scan(&self, code: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 OR barcode = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Lists products with stock below the given threshold.
    pub async fn low_stock(&self, merchant_id: &str, threshold: i64) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE merchant_id = ?1 AND stock < ?2 ORDER BY stock"
        ))
        .bind(merchant_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Fetches a product inside a transaction, for stock checks that must
    /// see the same snapshot the following update will apply to.
    pub async fn get_for_update(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Inserts a new product.
    pub async fn insert(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, merchant_id, name, cost_price_paise, selling_price_paise,
                stock, category, gst_bps, barcode, image_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.merchant_id)
        .bind(&product.name)
        .bind(product.cost_price_paise)
        .bind(product.selling_price_paise)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.gst_bps)
        .bind(&product.barcode)
        .bind(&product.image_ref)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    pub async fn update(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                name = ?2, cost_price_paise = ?3, selling_price_paise = ?4,
                stock = ?5, category = ?6, gst_bps = ?7, barcode = ?8,
                image_ref = ?9, updated_at = ?10
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.cost_price_paise)
        .bind(product.selling_price_paise)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.gst_bps)
        .bind(&product.barcode)
        .bind(&product.image_ref)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a stock delta: negative for a sale, positive for a receipt.
    pub async fn adjust_stock(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product. Irreversible.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products for a merchant (diagnostics).
    pub async fn count(&self, merchant_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE merchant_id = ?1")
                .bind(merchant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::testing::{memory_db, sample_product};
    use dhandha_core::DEFAULT_MERCHANT_ID;

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let db = memory_db().await;
        let repo = db.products();

        let mut product = sample_product("p1", 14500, 50);
        product.category = "Oils".to_string();
        product.gst_bps = Some(1800);

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &product).await.unwrap();
        tx.commit().await.unwrap();

        let fetched = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(fetched.cost_price_paise, product.cost_price_paise);
        assert_eq!(fetched.selling_price_paise, product.selling_price_paise);
        assert_eq!(fetched.stock, 50);
        assert_eq!(fetched.category, "Oils");
        assert_eq!(fetched.gst_bps, Some(1800));
    }

    #[tokio::test]
    async fn test_get_by_scan_matches_id_or_barcode() {
        let db = memory_db().await;
        let repo = db.products();

        let mut product = sample_product("p1", 9500, 25);
        product.barcode = Some("8901030576363".to_string());

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &product).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.get_by_scan("p1").await.unwrap().is_some());
        assert!(repo.get_by_scan("8901030576363").await.unwrap().is_some());
        assert!(repo.get_by_scan("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = memory_db().await;
        let repo = db.products();

        let mut first = sample_product("p1", 1000, 10);
        first.barcode = Some("123".to_string());
        let mut second = sample_product("p2", 2000, 10);
        second.barcode = Some("123".to_string());

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &first).await.unwrap();
        let err = repo.insert(&mut tx, &second).await.unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_adjust_stock_delta() {
        let db = memory_db().await;
        let repo = db.products();

        let product = sample_product("p1", 1000, 50);
        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &product).await.unwrap();
        repo.adjust_stock(&mut tx, "p1", -3).await.unwrap();
        repo.adjust_stock(&mut tx, "p1", 10).await.unwrap();
        tx.commit().await.unwrap();

        let fetched = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(fetched.stock, 57);
    }

    #[tokio::test]
    async fn test_adjust_stock_unknown_product() {
        let db = memory_db().await;
        let repo = db.products();

        let mut tx = db.begin().await.unwrap();
        let err = repo.adjust_stock(&mut tx, "ghost", 1).await.unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = memory_db().await;
        let repo = db.products();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_product("low", 1000, 5))
            .await
            .unwrap();
        repo.insert(&mut tx, &sample_product("ok", 1000, 40))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let low = repo.low_stock(DEFAULT_MERCHANT_ID, 20).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "low");
    }

    #[tokio::test]
    async fn test_delete_is_gone() {
        let db = memory_db().await;
        let repo = db.products();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_product("p1", 1000, 10))
            .await
            .unwrap();
        repo.delete(&mut tx, "p1").await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.get_by_id("p1").await.unwrap().is_none());
    }
}

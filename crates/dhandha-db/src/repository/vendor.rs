//! # Vendor Repository
//!
//! Suppliers and their purchase bills (the payables side). Recording a
//! bill raises the vendor balance; payments lower it with the same
//! zero-clamp the customer ledger uses.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dhandha_core::{Vendor, VendorBill};

#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: String,
    merchant_id: String,
    name: String,
    phone: Option<String>,
    category: String,
    balance_paise: i64,
    next_payment_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor {
            id: row.id,
            merchant_id: row.merchant_id,
            name: row.name,
            phone: row.phone,
            category: row.category,
            balance_paise: row.balance_paise,
            next_payment_date: row.next_payment_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: String,
    vendor_id: String,
    bill_date: NaiveDate,
    amount_paise: i64,
    items_description: String,
    receipt_ref: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BillRow> for VendorBill {
    fn from(row: BillRow) -> Self {
        VendorBill {
            id: row.id,
            vendor_id: row.vendor_id,
            bill_date: row.bill_date,
            amount_paise: row.amount_paise,
            items_description: row.items_description,
            receipt_ref: row.receipt_ref,
            created_at: row.created_at,
        }
    }
}

const VENDOR_COLUMNS: &str =
    "id, merchant_id, name, phone, category, balance_paise, next_payment_date, created_at";

const BILL_COLUMNS: &str =
    "id, vendor_id, bill_date, amount_paise, items_description, receipt_ref, created_at";

/// Repository for vendor and bill database operations.
#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: SqlitePool,
}

impl VendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VendorRepository { pool }
    }

    /// Lists all vendors for a merchant, sorted by name.
    pub async fn list(&self, merchant_id: &str) -> DbResult<Vec<Vendor>> {
        let rows: Vec<VendorRow> = sqlx::query_as(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE merchant_id = ?1 ORDER BY name"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Vendor::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Vendor>> {
        let row: Option<VendorRow> = sqlx::query_as(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Vendor::from))
    }

    /// Finds a vendor for a merchant by exact name. Used when an expense
    /// references a vendor that may not exist yet.
    pub async fn get_by_name(&self, merchant_id: &str, name: &str) -> DbResult<Option<Vendor>> {
        let row: Option<VendorRow> = sqlx::query_as(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE merchant_id = ?1 AND name = ?2"
        ))
        .bind(merchant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Vendor::from))
    }

    pub async fn get_for_update(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Vendor>> {
        let row: Option<VendorRow> = sqlx::query_as(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Vendor::from))
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, vendor: &Vendor) -> DbResult<()> {
        debug!(id = %vendor.id, name = %vendor.name, "inserting vendor");

        sqlx::query(
            "INSERT INTO vendors (
                id, merchant_id, name, phone, category,
                balance_paise, next_payment_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&vendor.id)
        .bind(&vendor.merchant_id)
        .bind(&vendor.name)
        .bind(&vendor.phone)
        .bind(&vendor.category)
        .bind(vendor.balance_paise)
        .bind(vendor.next_payment_date)
        .bind(vendor.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates identity fields and the payment reminder date. Balance moves
    /// only through the balance methods.
    pub async fn update(&self, conn: &mut SqliteConnection, vendor: &Vendor) -> DbResult<()> {
        debug!(id = %vendor.id, "updating vendor");

        let result = sqlx::query(
            "UPDATE vendors SET
                name = ?2, phone = ?3, category = ?4, next_payment_date = ?5
             WHERE id = ?1",
        )
        .bind(&vendor.id)
        .bind(&vendor.name)
        .bind(&vendor.phone)
        .bind(&vendor.category)
        .bind(vendor.next_payment_date)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", &vendor.id));
        }

        Ok(())
    }

    /// Deletes a vendor and, through the cascade, its bills.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "deleting vendor");

        let result = sqlx::query("DELETE FROM vendors WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Raises the vendor balance (a new bill received).
    pub async fn add_balance(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(id = %id, amount_paise, "adding to vendor balance");

        let result =
            sqlx::query("UPDATE vendors SET balance_paise = balance_paise + ?2 WHERE id = ?1")
                .bind(id)
                .bind(amount_paise)
                .execute(&mut *conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Records a payment against the balance, clamped at zero.
    pub async fn subtract_balance_clamped(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(id = %id, amount_paise, "paying down vendor balance");

        let result = sqlx::query(
            "UPDATE vendors SET balance_paise = MAX(0, balance_paise - ?2) WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_paise)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Raw sum of vendor balances for a merchant.
    pub async fn total_payables(&self, merchant_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(balance_paise) FROM vendors WHERE merchant_id = ?1")
                .bind(merchant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }

    /// Lists a vendor's bills, newest first.
    pub async fn bills(&self, vendor_id: &str) -> DbResult<Vec<VendorBill>> {
        let rows: Vec<BillRow> = sqlx::query_as(&format!(
            "SELECT {BILL_COLUMNS} FROM vendor_bills \
             WHERE vendor_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VendorBill::from).collect())
    }

    pub async fn insert_bill(&self, conn: &mut SqliteConnection, bill: &VendorBill) -> DbResult<()> {
        debug!(id = %bill.id, vendor_id = %bill.vendor_id, "inserting vendor bill");

        sqlx::query(
            "INSERT INTO vendor_bills (
                id, vendor_id, bill_date, amount_paise,
                items_description, receipt_ref, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&bill.id)
        .bind(&bill.vendor_id)
        .bind(bill.bill_date)
        .bind(bill.amount_paise)
        .bind(&bill.items_description)
        .bind(&bill.receipt_ref)
        .bind(bill.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dhandha_core::{VendorBill, DEFAULT_MERCHANT_ID};

    use crate::repository::testing::{memory_db, sample_vendor};

    fn sample_bill(id: &str, vendor_id: &str, amount_paise: i64) -> VendorBill {
        VendorBill {
            id: id.to_string(),
            vendor_id: vendor_id.to_string(),
            bill_date: Utc::now().date_naive(),
            amount_paise,
            items_description: "Atta 20 bags".to_string(),
            receipt_ref: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_bill_raises_balance_payment_clamps() {
        let db = memory_db().await;
        let repo = db.vendors();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_vendor("v1", 0)).await.unwrap();
        repo.insert_bill(&mut tx, &sample_bill("b1", "v1", 500000))
            .await
            .unwrap();
        repo.add_balance(&mut tx, "v1", 500000).await.unwrap();
        repo.subtract_balance_clamped(&mut tx, "v1", 600000)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let vendor = repo.get_by_id("v1").await.unwrap().unwrap();
        assert_eq!(vendor.balance_paise, 0);

        let bills = repo.bills("v1").await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].amount_paise, 500000);
    }

    #[tokio::test]
    async fn test_bill_requires_existing_vendor() {
        let db = memory_db().await;
        let repo = db.vendors();

        let mut tx = db.begin().await.unwrap();
        let err = repo
            .insert_bill(&mut tx, &sample_bill("b1", "ghost", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_total_payables_is_raw_sum() {
        let db = memory_db().await;
        let repo = db.vendors();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_vendor("v1", 500000))
            .await
            .unwrap();
        repo.insert(&mut tx, &sample_vendor("v2", 120000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let total = repo.total_payables(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(total, 620000);
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let db = memory_db().await;
        let repo = db.vendors();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_vendor("v1", 0)).await.unwrap();
        tx.commit().await.unwrap();

        let found = repo
            .get_by_name(DEFAULT_MERCHANT_ID, "Vendor v1")
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(repo
            .get_by_name(DEFAULT_MERCHANT_ID, "Nobody")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_bills() {
        let db = memory_db().await;
        let repo = db.vendors();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_vendor("v1", 0)).await.unwrap();
        repo.insert_bill(&mut tx, &sample_bill("b1", "v1", 1000))
            .await
            .unwrap();
        repo.delete(&mut tx, "v1").await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.bills("v1").await.unwrap().is_empty());
    }
}

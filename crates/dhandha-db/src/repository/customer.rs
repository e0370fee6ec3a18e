//! # Customer Repository
//!
//! Customers and their dues (the khata). Balance updates and due
//! settlement are the mutations the credit ledger composes into
//! transactions; settlement is one-way and clamps the balance at zero.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use dhandha_core::{Customer, CustomerDue, DueItem};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    merchant_id: String,
    name: String,
    phone: String,
    balance_paise: i64,
    last_transaction_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            merchant_id: row.merchant_id,
            name: row.name,
            phone: row.phone,
            balance_paise: row.balance_paise,
            last_transaction_date: row.last_transaction_date,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DueRow {
    id: String,
    customer_id: String,
    amount_paise: i64,
    description: String,
    items_json: Option<String>,
    due_date: NaiveDate,
    paid: bool,
    created_at: DateTime<Utc>,
}

impl DueRow {
    fn into_domain(self) -> DbResult<CustomerDue> {
        let items: Option<Vec<DueItem>> = match self.items_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(CustomerDue {
            id: self.id,
            customer_id: self.customer_id,
            amount_paise: self.amount_paise,
            description: self.description,
            items,
            due_date: self.due_date,
            paid: self.paid,
            created_at: self.created_at,
        })
    }
}

const CUSTOMER_COLUMNS: &str =
    "id, merchant_id, name, phone, balance_paise, last_transaction_date, created_at";

const DUE_COLUMNS: &str =
    "id, customer_id, amount_paise, description, items_json, due_date, paid, created_at";

/// Repository for customer and due database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Lists all customers for a merchant, sorted by name.
    pub async fn list(&self, merchant_id: &str) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE merchant_id = ?1 ORDER BY name"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Fetches a customer inside a transaction so the balance read and the
    /// balance write see the same state.
    pub async fn get_for_update(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Customer::from))
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "inserting customer");

        sqlx::query(
            "INSERT INTO customers (
                id, merchant_id, name, phone, balance_paise,
                last_transaction_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&customer.id)
        .bind(&customer.merchant_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.balance_paise)
        .bind(customer.last_transaction_date)
        .bind(customer.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates name and phone. Balance moves only through the dedicated
    /// balance methods below.
    pub async fn update(&self, conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "updating customer");

        let result = sqlx::query("UPDATE customers SET name = ?2, phone = ?3 WHERE id = ?1")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    /// Deletes a customer and, through the cascade, their dues.
    /// Transactions keep their weak reference.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Adds to the customer's balance (a new udhaar).
    pub async fn add_balance(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(id = %id, amount_paise, "adding to customer balance");

        let result = sqlx::query(
            "UPDATE customers SET balance_paise = balance_paise + ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_paise)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Subtracts a settled amount, clamping the balance at zero so a
    /// repeated settlement can never drive it negative.
    pub async fn subtract_balance_clamped(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(id = %id, amount_paise, "settling customer balance");

        let result = sqlx::query(
            "UPDATE customers SET balance_paise = MAX(0, balance_paise - ?2) WHERE id = ?1",
        )
        .bind(id)
        .bind(amount_paise)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Stamps the customer's last transaction date.
    pub async fn touch_last_transaction(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        date: NaiveDate,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE customers SET last_transaction_date = ?2 WHERE id = ?1")
            .bind(id)
            .bind(date)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Sum of positive balances for a merchant. Overpaid customers
    /// contribute zero, not a negative offset.
    pub async fn total_receivables(&self, merchant_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(CASE WHEN balance_paise > 0 THEN balance_paise ELSE 0 END)
             FROM customers WHERE merchant_id = ?1",
        )
        .bind(merchant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    // =========================================================================
    // Dues
    // =========================================================================

    /// Lists a customer's dues, newest first.
    pub async fn dues(&self, customer_id: &str) -> DbResult<Vec<CustomerDue>> {
        let rows: Vec<DueRow> = sqlx::query_as(&format!(
            "SELECT {DUE_COLUMNS} FROM customer_dues \
             WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DueRow::into_domain).collect()
    }

    pub async fn insert_due(&self, conn: &mut SqliteConnection, due: &CustomerDue) -> DbResult<()> {
        debug!(id = %due.id, customer_id = %due.customer_id, "inserting due");

        let items_json = match &due.items {
            Some(items) => Some(serde_json::to_string(items)?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO customer_dues (
                id, customer_id, amount_paise, description,
                items_json, due_date, paid, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&due.id)
        .bind(&due.customer_id)
        .bind(due.amount_paise)
        .bind(&due.description)
        .bind(items_json)
        .bind(due.due_date)
        .bind(due.paid)
        .bind(due.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fetches one due belonging to the given customer, inside a
    /// transaction.
    pub async fn get_due_for_update(
        &self,
        conn: &mut SqliteConnection,
        customer_id: &str,
        due_id: &str,
    ) -> DbResult<Option<CustomerDue>> {
        let row: Option<DueRow> = sqlx::query_as(&format!(
            "SELECT {DUE_COLUMNS} FROM customer_dues WHERE id = ?1 AND customer_id = ?2"
        ))
        .bind(due_id)
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(DueRow::into_domain).transpose()
    }

    /// Marks a due paid. Returns `true` if the flag flipped, `false` if it
    /// was already paid; the one-way transition makes settlement
    /// idempotent.
    pub async fn mark_due_paid(
        &self,
        conn: &mut SqliteConnection,
        due_id: &str,
    ) -> DbResult<bool> {
        debug!(id = %due_id, "marking due paid");

        let result = sqlx::query("UPDATE customer_dues SET paid = 1 WHERE id = ?1 AND paid = 0")
            .bind(due_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use dhandha_core::{CustomerDue, DueItem, DEFAULT_MERCHANT_ID};

    use crate::repository::testing::{memory_db, sample_customer};

    fn sample_due(id: &str, customer_id: &str, amount_paise: i64) -> CustomerDue {
        CustomerDue {
            id: id.to_string(),
            customer_id: customer_id.to_string(),
            amount_paise,
            description: format!("Bill #{id} \u{2022} 1 item(s)"),
            items: Some(vec![DueItem {
                name: "Rice 5kg".to_string(),
                quantity: 1,
                price_paise: amount_paise,
            }]),
            due_date: Utc::now().date_naive(),
            paid: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_balance_add_and_clamped_subtract() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_customer("c1", 0)).await.unwrap();
        repo.add_balance(&mut tx, "c1", 25000).await.unwrap();
        repo.subtract_balance_clamped(&mut tx, "c1", 40000)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let customer = repo.get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(customer.balance_paise, 0);
    }

    #[tokio::test]
    async fn test_due_round_trip_with_items() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_customer("c1", 0)).await.unwrap();
        repo.insert_due(&mut tx, &sample_due("d1", "c1", 25000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let dues = repo.dues("c1").await.unwrap();
        assert_eq!(dues.len(), 1);
        assert_eq!(dues[0].amount_paise, 25000);
        let items = dues[0].items.as_ref().unwrap();
        assert_eq!(items[0].name, "Rice 5kg");
        assert!(!dues[0].paid);
    }

    #[tokio::test]
    async fn test_mark_due_paid_is_one_way() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_customer("c1", 0)).await.unwrap();
        repo.insert_due(&mut tx, &sample_due("d1", "c1", 10000))
            .await
            .unwrap();

        assert!(repo.mark_due_paid(&mut tx, "d1").await.unwrap());
        // Second settlement is a no-op.
        assert!(!repo.mark_due_paid(&mut tx, "d1").await.unwrap());
    }

    #[tokio::test]
    async fn test_due_requires_existing_customer() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        let err = repo
            .insert_due(&mut tx, &sample_due("d1", "ghost", 10000))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_dues() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_customer("c1", 0)).await.unwrap();
        repo.insert_due(&mut tx, &sample_due("d1", "c1", 10000))
            .await
            .unwrap();
        repo.delete(&mut tx, "c1").await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.dues("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_receivables_ignores_negative_balances() {
        let db = memory_db().await;
        let repo = db.customers();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_customer("c1", 45000))
            .await
            .unwrap();
        repo.insert(&mut tx, &sample_customer("c2", -500))
            .await
            .unwrap();
        repo.insert(&mut tx, &sample_customer("c3", 12000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let total = repo.total_receivables(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(total, 57000);
    }
}

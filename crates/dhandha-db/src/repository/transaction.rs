//! # Transaction Repository
//!
//! The append-only sale history. Transactions are inserted inside the
//! sale engine's write transaction and never updated or deleted.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dhandha_core::{PaymentMethod, Transaction, TransactionItem};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    merchant_id: String,
    customer_id: Option<String>,
    customer_name: String,
    amount_paise: i64,
    payment_method: PaymentMethod,
    items_count: i64,
    bill_id: String,
    items_json: Option<String>,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> DbResult<Transaction> {
        let items: Option<Vec<TransactionItem>> = match self.items_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(Transaction {
            id: self.id,
            merchant_id: self.merchant_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            amount_paise: self.amount_paise,
            payment_method: self.payment_method,
            items_count: self.items_count,
            bill_id: self.bill_id,
            items,
            created_at: self.created_at,
        })
    }
}

const TRANSACTION_COLUMNS: &str = "id, merchant_id, customer_id, customer_name, amount_paise, \
     payment_method, items_count, bill_id, items_json, created_at";

/// Repository for the sale history.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        transaction: &Transaction,
    ) -> DbResult<()> {
        debug!(
            id = %transaction.id,
            bill_id = %transaction.bill_id,
            amount_paise = transaction.amount_paise,
            "inserting transaction"
        );

        let items_json = match &transaction.items {
            Some(items) => Some(serde_json::to_string(items)?),
            None => None,
        };

        sqlx::query(
            "INSERT INTO transactions (
                id, merchant_id, customer_id, customer_name, amount_paise,
                payment_method, items_count, bill_id, items_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&transaction.id)
        .bind(&transaction.merchant_id)
        .bind(&transaction.customer_id)
        .bind(&transaction.customer_name)
        .bind(transaction.amount_paise)
        .bind(transaction.payment_method)
        .bind(transaction.items_count)
        .bind(&transaction.bill_id)
        .bind(items_json)
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Most recent transactions first.
    pub async fn list_recent(&self, merchant_id: &str, limit: i64) -> DbResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE merchant_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))
        .bind(merchant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_domain).transpose()
    }

    /// Transactions recorded for one customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_domain).collect()
    }

    /// Total revenue between two instants (inclusive start, exclusive end).
    pub async fn revenue_between(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_paise) FROM transactions
             WHERE merchant_id = ?1 AND created_at >= ?2 AND created_at < ?3",
        )
        .bind(merchant_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Lifetime revenue for a merchant.
    pub async fn total_revenue(&self, merchant_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_paise) FROM transactions WHERE merchant_id = ?1")
                .bind(merchant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use dhandha_core::{PaymentMethod, Transaction, TransactionItem, DEFAULT_MERCHANT_ID};

    use crate::repository::testing::memory_db;

    fn sample_transaction(id: &str, amount_paise: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            customer_id: None,
            customer_name: "Guest".to_string(),
            amount_paise,
            payment_method: PaymentMethod::Cash,
            items_count: 1,
            bill_id: "4821".to_string(),
            items: Some(vec![TransactionItem {
                product_id: "p1".to_string(),
                name: "Rice 5kg".to_string(),
                quantity: 1,
                unit_price_paise: amount_paise,
                discount_paise: 0,
                line_total_paise: amount_paise,
            }]),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_recent_first() {
        let db = memory_db().await;
        let repo = db.transactions();

        let mut first = sample_transaction("t1", 10000);
        first.created_at = Utc::now() - Duration::minutes(10);
        let second = sample_transaction("t2", 20000);

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &first).await.unwrap();
        repo.insert(&mut tx, &second).await.unwrap();
        tx.commit().await.unwrap();

        let recent = repo.list_recent(DEFAULT_MERCHANT_ID, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "t2");
        assert_eq!(recent[1].id, "t1");
    }

    #[tokio::test]
    async fn test_items_snapshot_round_trip() {
        let db = memory_db().await;
        let repo = db.transactions();

        let transaction = sample_transaction("t1", 25000);
        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &transaction).await.unwrap();
        tx.commit().await.unwrap();

        let fetched = repo.get_by_id("t1").await.unwrap().unwrap();
        assert_eq!(fetched.payment_method, PaymentMethod::Cash);
        let items = fetched.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Rice 5kg");
        assert_eq!(items[0].line_total_paise, 25000);
    }

    #[tokio::test]
    async fn test_revenue_between_windows() {
        let db = memory_db().await;
        let repo = db.transactions();

        let now = Utc::now();
        let mut old = sample_transaction("t1", 10000);
        old.created_at = now - Duration::days(10);
        let recent = sample_transaction("t2", 20000);

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &old).await.unwrap();
        repo.insert(&mut tx, &recent).await.unwrap();
        tx.commit().await.unwrap();

        let week = repo
            .revenue_between(
                DEFAULT_MERCHANT_ID,
                now - Duration::days(7),
                now + Duration::seconds(1),
            )
            .await
            .unwrap();
        assert_eq!(week, 20000);

        let all = repo.total_revenue(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(all, 30000);
    }
}

//! # Expense Repository
//!
//! Recorded business expenses. An expense may name a vendor for
//! bookkeeping; the vendor's payable balance is untouched by it.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dhandha_core::Expense;

#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    merchant_id: String,
    amount_paise: i64,
    category: String,
    description: String,
    expense_date: NaiveDate,
    vendor_id: Option<String>,
    vendor_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            merchant_id: row.merchant_id,
            amount_paise: row.amount_paise,
            category: row.category,
            description: row.description,
            expense_date: row.expense_date,
            vendor_id: row.vendor_id,
            vendor_name: row.vendor_name,
            created_at: row.created_at,
        }
    }
}

const EXPENSE_COLUMNS: &str = "id, merchant_id, amount_paise, category, description, \
     expense_date, vendor_id, vendor_name, created_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, expense: &Expense) -> DbResult<()> {
        debug!(
            id = %expense.id,
            category = %expense.category,
            amount_paise = expense.amount_paise,
            "inserting expense"
        );

        sqlx::query(
            "INSERT INTO expenses (
                id, merchant_id, amount_paise, category, description,
                expense_date, vendor_id, vendor_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&expense.id)
        .bind(&expense.merchant_id)
        .bind(expense.amount_paise)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.expense_date)
        .bind(&expense.vendor_id)
        .bind(&expense.vendor_name)
        .bind(expense.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Lists all expenses for a merchant, newest expense date first.
    pub async fn list(&self, merchant_id: &str) -> DbResult<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE merchant_id = ?1 ORDER BY expense_date DESC, created_at DESC"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    /// Sum of expenses whose date falls in [from, to].
    pub async fn total_between(
        &self,
        merchant_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_paise) FROM expenses
             WHERE merchant_id = ?1 AND expense_date >= ?2 AND expense_date <= ?3",
        )
        .bind(merchant_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Lifetime expense total for a merchant.
    pub async fn total(&self, merchant_id: &str) -> DbResult<i64> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT SUM(amount_paise) FROM expenses WHERE merchant_id = ?1")
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
    use dhandha_core::{Expense, DEFAULT_MERCHANT_ID};

    use crate::repository::testing::memory_db;

    fn sample_expense(id: &str, amount_paise: i64) -> Expense {
        Expense {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            amount_paise,
            category: "Rent".to_string(),
            description: "Shop rent".to_string(),
            expense_date: Utc::now().date_naive(),
            vendor_id: None,
            vendor_name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = memory_db().await;
        let repo = db.expenses();

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &sample_expense("e1", 1500000))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let expenses = repo.list(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount_paise, 1500000);
        assert_eq!(expenses[0].category, "Rent");
    }

    #[tokio::test]
    async fn test_totals_respect_date_window() {
        let db = memory_db().await;
        let repo = db.expenses();

        let today = Utc::now().date_naive();
        let mut old = sample_expense("e1", 10000);
        old.expense_date = today - Duration::days(40);
        let recent = sample_expense("e2", 20000);

        let mut tx = db.begin().await.unwrap();
        repo.insert(&mut tx, &old).await.unwrap();
        repo.insert(&mut tx, &recent).await.unwrap();
        tx.commit().await.unwrap();

        let month = repo
            .total_between(DEFAULT_MERCHANT_ID, today - Duration::days(30), today)
            .await
            .unwrap();
        assert_eq!(month, 20000);

        let all = repo.total(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(all, 30000);
    }
}

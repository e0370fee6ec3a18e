//! # Reports
//!
//! Pure read-side aggregations: receivables, payables, revenue, expenses,
//! profit, the weekly sales series, and the dashboard summary. Nothing
//! here mutates; everything is recomputed from current state on demand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use dhandha_core::{DaySales, Money, Transaction};
use dhandha_db::Database;

use crate::error::LedgerResult;

/// Everything the dashboard shows, in one read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub revenue_paise: i64,
    pub expense_total_paise: i64,
    pub profit_paise: i64,
    pub total_receivables_paise: i64,
    pub total_payables_paise: i64,
    pub cash_in_hand_paise: i64,
    pub weekly_sales: Vec<DaySales>,
    pub recent_transactions: Vec<Transaction>,
    pub low_stock_count: usize,
}

/// Read-side reporting over the whole store.
#[derive(Debug, Clone)]
pub struct Reports {
    db: Database,
    merchant_id: String,
    low_stock_threshold: i64,
}

impl Reports {
    pub fn new(db: Database, merchant_id: impl Into<String>, low_stock_threshold: i64) -> Self {
        Reports {
            db,
            merchant_id: merchant_id.into(),
            low_stock_threshold,
        }
    }

    /// Σ transaction amounts with created_at in [from, to).
    pub async fn revenue(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LedgerResult<Money> {
        let paise = self
            .db
            .transactions()
            .revenue_between(&self.merchant_id, from, to)
            .await?;
        Ok(Money::from_paise(paise))
    }

    /// Lifetime revenue.
    pub async fn total_revenue(&self) -> LedgerResult<Money> {
        let paise = self
            .db
            .transactions()
            .total_revenue(&self.merchant_id)
            .await?;
        Ok(Money::from_paise(paise))
    }

    /// Σ recorded expenses dated in [from, to].
    pub async fn expense_total(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<Money> {
        let paise = self
            .db
            .expenses()
            .total_between(&self.merchant_id, from, to)
            .await?;
        Ok(Money::from_paise(paise))
    }

    /// Profit = revenue minus recorded expenses for the same period.
    ///
    /// This is always computed from the real expense list. May be negative
    /// when expenses exceed revenue.
    pub async fn profit(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LedgerResult<Money> {
        let revenue = self.revenue(from, to).await?;
        let expenses = self
            .expense_total(from.date_naive(), to.date_naive())
            .await?;
        Ok(revenue - expenses)
    }

    pub async fn total_receivables(&self) -> LedgerResult<Money> {
        let paise = self
            .db
            .customers()
            .total_receivables(&self.merchant_id)
            .await?;
        Ok(Money::from_paise(paise))
    }

    pub async fn total_payables(&self) -> LedgerResult<Money> {
        let paise = self.db.vendors().total_payables(&self.merchant_id).await?;
        Ok(Money::from_paise(paise))
    }

    /// Seven weekday buckets, Monday through Sunday.
    pub async fn weekly_sales(&self) -> LedgerResult<Vec<DaySales>> {
        Ok(self.db.shop().weekly_sales(&self.merchant_id).await?)
    }

    pub async fn cash_in_hand(&self) -> LedgerResult<Money> {
        let paise = self.db.shop().cash_in_hand(&self.merchant_id).await?;
        Ok(Money::from_paise(paise))
    }

    pub async fn recent_transactions(&self, limit: i64) -> LedgerResult<Vec<Transaction>> {
        Ok(self
            .db
            .transactions()
            .list_recent(&self.merchant_id, limit)
            .await?)
    }

    /// One read bundling everything the dashboard needs.
    pub async fn dashboard_summary(&self) -> LedgerResult<DashboardSummary> {
        let revenue = self.total_revenue().await?;
        let expense_total = Money::from_paise(self.db.expenses().total(&self.merchant_id).await?);
        let receivables = self.total_receivables().await?;
        let payables = self.total_payables().await?;
        let cash = self.cash_in_hand().await?;
        let weekly_sales = self.weekly_sales().await?;
        let recent_transactions = self.recent_transactions(10).await?;
        let low_stock = self
            .db
            .products()
            .low_stock(&self.merchant_id, self.low_stock_threshold)
            .await?;

        Ok(DashboardSummary {
            revenue_paise: revenue.paise(),
            expense_total_paise: expense_total.paise(),
            profit_paise: (revenue - expense_total).paise(),
            total_receivables_paise: receivables.paise(),
            total_payables_paise: payables.paise(),
            cash_in_hand_paise: cash.paise(),
            weekly_sales,
            recent_transactions,
            low_stock_count: low_stock.len(),
        })
    }
}

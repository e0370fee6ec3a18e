//! # Dhandha Ledger
//!
//! The transactional service layer: checkout, inventory, customer khata,
//! vendor payables, expenses, and read-side reports over a
//! [`dhandha_db::Database`].
//!
//! ## Architecture
//! - `engine`: [`SaleEngine`] turns a cart into a persisted sale
//! - `inventory`: product CRUD and stock movement
//! - `credit`: [`CreditLedger`], the customer khata
//! - `payables`: [`VendorPayables`], supplier bills and payments
//! - `expenses`: expense recording
//! - `reports`: pure read-side aggregations
//! - `boundary`: trait contracts for external collaborators
//!
//! Every logical operation that writes more than one row runs inside one
//! database transaction; failure leaves the store unchanged.

pub mod boundary;
pub mod config;
pub mod credit;
pub mod engine;
pub mod error;
pub mod expenses;
pub mod inventory;
pub mod payables;
pub mod reports;

pub use config::{LedgerConfig, StockPolicy};
pub use credit::CreditLedger;
pub use engine::{CustomerRef, SaleEngine, SaleReceipt};
pub use error::{LedgerError, LedgerResult};
pub use expenses::{ExpenseVendorRef, Expenses};
pub use inventory::{Inventory, NewProduct};
pub use payables::{NewVendor, VendorPayables};
pub use reports::{DashboardSummary, Reports};

use dhandha_core::DEFAULT_MERCHANT_ID;
use dhandha_db::{Database, DbError, DbTransaction};

/// Commits a write transaction, mapping the failure into the ledger
/// taxonomy.
pub(crate) async fn commit(tx: DbTransaction) -> LedgerResult<()> {
    tx.commit()
        .await
        .map_err(|e| LedgerError::Store(DbError::TransactionFailed(e.to_string())))
}

/// Facade bundling all services for one merchant.
///
/// Cloning is cheap; every service shares the same pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    config: LedgerConfig,
    merchant_id: String,
}

impl Ledger {
    /// A ledger for the single-shop case.
    pub fn new(db: Database, config: LedgerConfig) -> Self {
        Ledger::for_merchant(db, config, DEFAULT_MERCHANT_ID)
    }

    /// A ledger namespaced to a merchant ID (from the session provider).
    pub fn for_merchant(db: Database, config: LedgerConfig, merchant_id: impl Into<String>) -> Self {
        Ledger {
            db,
            config,
            merchant_id: merchant_id.into(),
        }
    }

    pub fn sales(&self) -> SaleEngine {
        SaleEngine::new(self.db.clone(), self.config.clone(), self.merchant_id.clone())
    }

    pub fn inventory(&self) -> Inventory {
        Inventory::new(self.db.clone(), self.config.clone(), self.merchant_id.clone())
    }

    pub fn credit(&self) -> CreditLedger {
        CreditLedger::new(self.db.clone(), self.merchant_id.clone())
    }

    pub fn payables(&self) -> VendorPayables {
        VendorPayables::new(self.db.clone(), self.merchant_id.clone())
    }

    pub fn expenses(&self) -> Expenses {
        Expenses::new(self.db.clone(), self.merchant_id.clone())
    }

    pub fn reports(&self) -> Reports {
        Reports::new(
            self.db.clone(),
            self.merchant_id.clone(),
            self.config.low_stock_threshold,
        )
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }
}

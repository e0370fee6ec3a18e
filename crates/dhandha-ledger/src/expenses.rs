//! # Expense Service
//!
//! Recording business expenses. An expense may name a vendor for
//! bookkeeping; a name with no matching vendor creates one on the spot.
//! Recording an expense never moves a vendor's payable balance.

use chrono::{NaiveDate, Utc};
use tracing::info;

use dhandha_core::{validation, Expense, Money};
use dhandha_db::{new_id, Database};

use crate::error::LedgerResult;
use crate::payables::VendorPayables;

/// How an expense refers to a vendor, if at all.
#[derive(Debug, Clone)]
pub enum ExpenseVendorRef {
    /// An existing vendor by ID.
    Existing(String),

    /// A vendor by name; created with zero balance if unknown.
    Named(String),

    /// No vendor involved.
    None,
}

/// Expense recording and listing.
#[derive(Debug, Clone)]
pub struct Expenses {
    db: Database,
    merchant_id: String,
}

impl Expenses {
    pub fn new(db: Database, merchant_id: impl Into<String>) -> Self {
        Expenses {
            db,
            merchant_id: merchant_id.into(),
        }
    }

    pub async fn list(&self) -> LedgerResult<Vec<Expense>> {
        Ok(self.db.expenses().list(&self.merchant_id).await?)
    }

    /// Records an expense.
    pub async fn record_expense(
        &self,
        amount: Money,
        category: &str,
        description: &str,
        expense_date: NaiveDate,
        vendor_ref: ExpenseVendorRef,
    ) -> LedgerResult<Expense> {
        validation::validate_amount_paise(amount.paise())?;

        let (vendor_id, vendor_name) = match vendor_ref {
            ExpenseVendorRef::Existing(id) => {
                let payables = VendorPayables::new(self.db.clone(), self.merchant_id.clone());
                let vendor = payables.get(&id).await?;
                (Some(vendor.id), Some(vendor.name))
            }
            ExpenseVendorRef::Named(name) => {
                let existing = self
                    .db
                    .vendors()
                    .get_by_name(&self.merchant_id, name.trim())
                    .await?;
                let vendor = match existing {
                    Some(vendor) => vendor,
                    None => {
                        let payables =
                            VendorPayables::new(self.db.clone(), self.merchant_id.clone());
                        payables
                            .create_vendor_from_expense(name.trim(), category)
                            .await?
                    }
                };
                (Some(vendor.id), Some(vendor.name))
            }
            ExpenseVendorRef::None => (None, None),
        };

        let expense = Expense {
            id: new_id(),
            merchant_id: self.merchant_id.clone(),
            amount_paise: amount.paise(),
            category: category.to_string(),
            description: description.to_string(),
            expense_date,
            vendor_id,
            vendor_name,
            created_at: Utc::now(),
        };

        let mut tx = self.db.begin().await?;
        self.db.expenses().insert(&mut tx, &expense).await?;
        crate::commit(tx).await?;

        info!(
            id = %expense.id,
            category = %expense.category,
            amount_paise = amount.paise(),
            "expense recorded"
        );
        Ok(expense)
    }

    /// Sum of expenses dated in [from, to].
    pub async fn total_between(&self, from: NaiveDate, to: NaiveDate) -> LedgerResult<Money> {
        let paise = self
            .db
            .expenses()
            .total_between(&self.merchant_id, from, to)
            .await?;
        Ok(Money::from_paise(paise))
    }

    /// Lifetime expense total.
    pub async fn total(&self) -> LedgerResult<Money> {
        let paise = self.db.expenses().total(&self.merchant_id).await?;
        Ok(Money::from_paise(paise))
    }
}

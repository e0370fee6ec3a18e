//! # Credit Ledger (Khata)
//!
//! Customer credit: issuing dues, settling them, and the receivable
//! total. The khata invariant is `balance == Σ unpaid due amounts`;
//! settlement clamps the balance at zero so drift can only converge.

use chrono::Utc;
use tracing::{debug, info};

use dhandha_core::{validation, Customer, CustomerDue, DueItem, Money};
use dhandha_db::{new_id, Database};

use crate::error::{LedgerError, LedgerResult};

/// Customer khata operations.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    db: Database,
    merchant_id: String,
}

impl CreditLedger {
    pub fn new(db: Database, merchant_id: impl Into<String>) -> Self {
        CreditLedger {
            db,
            merchant_id: merchant_id.into(),
        }
    }

    pub async fn list_customers(&self) -> LedgerResult<Vec<Customer>> {
        Ok(self.db.customers().list(&self.merchant_id).await?)
    }

    pub async fn get_customer(&self, id: &str) -> LedgerResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Customer", id))
    }

    pub async fn create_customer(&self, name: &str, phone: &str) -> LedgerResult<Customer> {
        validation::validate_name(name)?;
        validation::validate_phone(phone)?;

        let customer = Customer {
            id: new_id(),
            merchant_id: self.merchant_id.clone(),
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
            balance_paise: 0,
            last_transaction_date: None,
            created_at: Utc::now(),
        };

        let mut tx = self.db.begin().await?;
        self.db.customers().insert(&mut tx, &customer).await?;
        crate::commit(tx).await?;

        info!(id = %customer.id, name = %customer.name, "customer created");
        Ok(customer)
    }

    pub async fn dues(&self, customer_id: &str) -> LedgerResult<Vec<CustomerDue>> {
        Ok(self.db.customers().dues(customer_id).await?)
    }

    /// Issues a manual due: appends the due and raises the balance in one
    /// transaction.
    pub async fn issue_due(
        &self,
        customer_id: &str,
        amount: Money,
        description: &str,
        items: Option<Vec<DueItem>>,
    ) -> LedgerResult<CustomerDue> {
        validation::validate_amount_paise(amount.paise())?;

        let customers = self.db.customers();
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let customer = customers
            .get_for_update(&mut tx, customer_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Customer", customer_id))?;

        let due = CustomerDue {
            id: new_id(),
            customer_id: customer.id.clone(),
            amount_paise: amount.paise(),
            description: description.to_string(),
            items,
            due_date: now.date_naive(),
            paid: false,
            created_at: now,
        };

        customers.insert_due(&mut tx, &due).await?;
        customers
            .add_balance(&mut tx, &customer.id, amount.paise())
            .await?;
        customers
            .touch_last_transaction(&mut tx, &customer.id, now.date_naive())
            .await?;

        crate::commit(tx).await?;

        info!(
            customer_id = %customer.id,
            due_id = %due.id,
            amount_paise = amount.paise(),
            "due issued"
        );
        Ok(due)
    }

    /// Settles a due: marks it paid and lowers the balance by its amount,
    /// floored at zero.
    ///
    /// Idempotent: settling an already-paid due changes nothing and
    /// returns the customer unchanged.
    pub async fn settle_due(&self, customer_id: &str, due_id: &str) -> LedgerResult<Customer> {
        let customers = self.db.customers();

        let mut tx = self.db.begin().await?;

        let due = customers
            .get_due_for_update(&mut tx, customer_id, due_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("CustomerDue", due_id))?;

        let flipped = customers.mark_due_paid(&mut tx, due_id).await?;
        if flipped {
            customers
                .subtract_balance_clamped(&mut tx, customer_id, due.amount_paise)
                .await?;
        } else {
            debug!(due_id = %due_id, "due already settled, no balance change");
        }

        crate::commit(tx).await?;

        let customer = self.get_customer(customer_id).await?;

        if flipped {
            info!(
                customer_id = %customer_id,
                due_id = %due_id,
                amount_paise = due.amount_paise,
                balance_paise = customer.balance_paise,
                "due settled"
            );
        }

        Ok(customer)
    }

    /// Σ over customers of max(0, balance). Overpayments are excluded, not
    /// netted off.
    pub async fn total_receivables(&self) -> LedgerResult<Money> {
        let paise = self
            .db
            .customers()
            .total_receivables(&self.merchant_id)
            .await?;
        Ok(Money::from_paise(paise))
    }
}

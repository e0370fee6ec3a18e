//! # Sale Engine
//!
//! Checkout: turns an in-memory cart into a persisted sale. A completed
//! sale touches up to five aggregates (stock, customer khata, transaction
//! history, cash drawer, weekday buckets) and all of them move inside one
//! database transaction. A sale either applies fully or leaves the store
//! untouched.

use chrono::{Datelike, Utc};
use tracing::{debug, info};

use dhandha_core::{
    validation, Cart, Customer, CustomerDue, DueItem, Money, PaymentMethod, Transaction,
};
use dhandha_db::{new_id, Database};

use crate::config::{LedgerConfig, StockPolicy};
use crate::error::{LedgerError, LedgerResult};

/// Who the sale is for.
#[derive(Debug, Clone)]
pub enum CustomerRef {
    /// An existing customer by ID.
    Existing(String),

    /// A customer created on the spot, with balance 0.
    New { name: String, phone: String },

    /// Anonymous walk-in. Cannot buy on credit.
    Guest,
}

/// The outcome of a completed sale.
#[derive(Debug, Clone)]
pub struct SaleReceipt {
    /// The recorded transaction.
    pub transaction: Transaction,

    /// Change owed to the customer on a cash sale. Zero otherwise.
    pub change_due: Money,
}

/// Orchestrates checkout against the database.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    db: Database,
    config: LedgerConfig,
    merchant_id: String,
}

impl SaleEngine {
    pub fn new(db: Database, config: LedgerConfig, merchant_id: impl Into<String>) -> Self {
        SaleEngine {
            db,
            config,
            merchant_id: merchant_id.into(),
        }
    }

    /// Completes a sale.
    ///
    /// Validation happens before any mutation; everything that writes runs
    /// inside a single transaction. `cash_given` is informational only,
    /// used for the change calculation and never persisted.
    pub async fn complete_sale(
        &self,
        cart: &Cart,
        customer_ref: CustomerRef,
        payment_method: PaymentMethod,
        cash_given: Option<Money>,
    ) -> LedgerResult<SaleReceipt> {
        if cart.is_empty() {
            return Err(dhandha_core::ValidationError::EmptyCart.into());
        }

        if payment_method.is_credit() && matches!(customer_ref, CustomerRef::Guest) {
            return Err(dhandha_core::ValidationError::CreditRequiresCustomer.into());
        }

        if let CustomerRef::New { name, phone } = &customer_ref {
            validation::validate_name(name)?;
            validation::validate_phone(phone)?;
        }

        let total = cart.total();
        let now = Utc::now();
        let bill_id = generate_bill_id(now.timestamp_millis());

        debug!(
            bill_id = %bill_id,
            total_paise = total.paise(),
            method = %payment_method,
            lines = cart.item_count(),
            "completing sale"
        );

        let products = self.db.products();
        let customers = self.db.customers();
        let transactions = self.db.transactions();
        let shop = self.db.shop();

        let mut tx = self.db.begin().await?;

        // Resolve the customer first so a bad reference fails before any
        // stock moves.
        let customer: Option<Customer> = match customer_ref {
            CustomerRef::Existing(id) => Some(
                customers
                    .get_for_update(&mut tx, &id)
                    .await?
                    .ok_or_else(|| LedgerError::not_found("Customer", &id))?,
            ),
            CustomerRef::New { name, phone } => {
                let new_customer = Customer {
                    id: new_id(),
                    merchant_id: self.merchant_id.clone(),
                    name,
                    phone,
                    balance_paise: 0,
                    last_transaction_date: None,
                    created_at: now,
                };
                customers.insert(&mut tx, &new_customer).await?;
                Some(new_customer)
            }
            CustomerRef::Guest => None,
        };

        // Stock moves, one line at a time.
        for line in &cart.items {
            let product = products
                .get_for_update(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Product", &line.product_id))?;

            if self.config.stock_policy == StockPolicy::BlockOversell
                && product.stock < line.quantity
            {
                return Err(LedgerError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            products
                .adjust_stock(&mut tx, &line.product_id, -line.quantity)
                .await?;
        }

        // Udhaar: record the due and raise the khata balance.
        if payment_method.is_credit() {
            let customer = customer
                .as_ref()
                .ok_or(dhandha_core::ValidationError::CreditRequiresCustomer)?;

            let due = CustomerDue {
                id: new_id(),
                customer_id: customer.id.clone(),
                amount_paise: total.paise(),
                description: format!("Bill #{bill_id} \u{2022} {} item(s)", cart.item_count()),
                items: Some(
                    cart.items
                        .iter()
                        .map(|line| DueItem {
                            name: line.name.clone(),
                            quantity: line.quantity,
                            price_paise: line.total_paise(),
                        })
                        .collect(),
                ),
                due_date: now.date_naive(),
                paid: false,
                created_at: now,
            };

            customers.insert_due(&mut tx, &due).await?;
            customers
                .add_balance(&mut tx, &customer.id, total.paise())
                .await?;
            customers
                .touch_last_transaction(&mut tx, &customer.id, now.date_naive())
                .await?;
        }

        // Physical cash moves the drawer.
        if payment_method.is_cash() {
            shop.add_cash(&mut tx, &self.merchant_id, total.paise())
                .await?;
        }

        let transaction = Transaction {
            id: new_id(),
            merchant_id: self.merchant_id.clone(),
            customer_id: customer.as_ref().map(|c| c.id.clone()),
            customer_name: customer
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Guest".to_string()),
            amount_paise: total.paise(),
            payment_method,
            items_count: cart.item_count() as i64,
            bill_id: bill_id.clone(),
            items: Some(cart.snapshot()),
            created_at: now,
        };

        transactions.insert(&mut tx, &transaction).await?;

        let weekday = now.date_naive().weekday().num_days_from_monday() as u8;
        shop.bump_day_sales(&mut tx, &self.merchant_id, weekday, total.paise())
            .await?;

        crate::commit(tx).await?;

        let change_due = match (payment_method.is_cash(), cash_given) {
            (true, Some(given)) => (given - total).clamp_at_zero(),
            _ => Money::zero(),
        };

        info!(
            bill_id = %bill_id,
            transaction_id = %transaction.id,
            total_paise = total.paise(),
            change_paise = change_due.paise(),
            "sale completed"
        );

        Ok(SaleReceipt {
            transaction,
            change_due,
        })
    }
}

/// Short display code for a bill: the last four digits of the creation
/// timestamp in milliseconds, zero padded.
fn generate_bill_id(timestamp_millis: i64) -> String {
    format!("{:04}", timestamp_millis.rem_euclid(10000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_id_is_last_four_digits() {
        assert_eq!(generate_bill_id(1735000004821), "4821");
        assert_eq!(generate_bill_id(1735000000007), "0007");
    }
}

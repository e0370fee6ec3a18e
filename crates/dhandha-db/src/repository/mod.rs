//! # Repositories
//!
//! One repository per entity aggregate. Read methods query the pool
//! directly; every mutating method takes a `&mut SqliteConnection` so the
//! service layer can compose several mutations into a single transaction.
//! No repository ever commits on its own.
//!
//! Row structs (`ProductRow`, `CustomerRow`, ...) form the explicit mapping
//! boundary between database column shapes and the domain types in
//! `dhandha-core`.

pub mod customer;
pub mod expense;
pub mod product;
pub mod shop;
pub mod transaction;
pub mod vendor;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use dhandha_core::{Customer, Product, Vendor, DEFAULT_MERCHANT_ID};

    use crate::pool::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub fn sample_product(id: &str, price_paise: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            name: format!("Product {id}"),
            cost_price_paise: price_paise / 2,
            selling_price_paise: price_paise,
            stock,
            category: "Staples".to_string(),
            gst_bps: None,
            barcode: None,
            image_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn sample_customer(id: &str, balance_paise: i64) -> Customer {
        Customer {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            name: format!("Customer {id}"),
            phone: "9876543210".to_string(),
            balance_paise,
            last_transaction_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn sample_vendor(id: &str, balance_paise: i64) -> Vendor {
        Vendor {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            name: format!("Vendor {id}"),
            phone: None,
            category: "General".to_string(),
            balance_paise,
            next_payment_date: None,
            created_at: Utc::now(),
        }
    }
}

//! # Dhandha DB
//!
//! SQLite persistence for the Dhandha ledger.
//!
//! ## Architecture
//! - `pool`: connection pool configuration and the [`Database`] handle
//! - `migrations`: embedded SQL migrations, applied on startup
//! - `repository`: one repository per entity aggregate
//! - `error`: database error taxonomy
//!
//! Repositories never commit: mutating methods take a
//! `&mut SqliteConnection` and the service layer brackets them with
//! [`Database::begin`] so each logical operation is atomic.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbTransaction};
pub use repository::customer::CustomerRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::new_id;
pub use repository::product::ProductRepository;
pub use repository::shop::ShopRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::vendor::VendorRepository;

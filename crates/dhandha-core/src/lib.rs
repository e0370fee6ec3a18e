//! # dhandha-core: Pure Business Logic
//!
//! The domain model for Dhandha, a small-merchant point-of-sale and ledger
//! application: billing, inventory, customer credit (khata/udhaar), vendor
//! payables, and expenses.
//!
//! Everything in this crate is pure: no database, no network, no file
//! system. The persistence layer lives in `dhandha-db` and the transactional
//! services in `dhandha-ledger`.
//!
//! ## Modules
//!
//! - [`types`] - Entity types (Product, Customer, Vendor, Transaction, ...)
//! - [`money`] - Integer money in paise (no floating point)
//! - [`cart`] - In-memory bill composition
//! - [`error`] - Validation error types
//! - [`validation`] - Business rule validation

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem};
pub use error::ValidationError;
pub use money::Money;
pub use types::*;

/// Default merchant ID for the single-shop runtime.
///
/// The schema namespaces every entity by merchant so an external session
/// provider can scope the store; a standalone deployment uses this constant.
pub const DEFAULT_MERCHANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum unique lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// Guards against fat-finger entries (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Stock level below which a product is flagged as low stock.
///
/// This is the default; the threshold is configurable per deployment.
pub const LOW_STOCK_THRESHOLD: i64 = 20;

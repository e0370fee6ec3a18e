//! # Domain Types
//!
//! The ledger entities: Product, Customer (+ CustomerDue), Vendor
//! (+ VendorBill), Transaction, Expense, and the merchant profile.
//!
//! Every entity carries a `merchant_id` so an external session provider can
//! namespace the store; a standalone shop uses [`crate::DEFAULT_MERCHANT_ID`].
//!
//! Ownership rules:
//! - A `Customer` exclusively owns its `CustomerDue` list.
//! - A `Vendor` exclusively owns its `VendorBill` list.
//! - A `Transaction` is a standalone append-only record; its `customer_id`
//!   is a weak reference with no cascade.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// GST Rate
// =============================================================================

/// GST rate in basis points (1 bps = 0.01%, so 1800 = 18%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GstRate(u32);

impl GstRate {
    /// Creates a GST rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Creates a GST rate from a percentage (18.0 = 18%).
    pub fn from_percentage(pct: f64) -> Self {
        GstRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// `Credit` is udhaar: the amount is added to the customer's khata instead
/// of being collected, and requires a resolved (non-guest) customer.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    GooglePay,
    PhonePe,
    Paytm,
    Credit,
}

impl PaymentMethod {
    /// True for udhaar sales, which post to the customer's credit ledger.
    #[inline]
    pub const fn is_credit(&self) -> bool {
        matches!(self, PaymentMethod::Credit)
    }

    /// True for physical cash, which moves cash-on-hand.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

/// Shop-facing labels, as printed on bills.
impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::GooglePay => "Google Pay",
            PaymentMethod::PhonePe => "PhonePe",
            PaymentMethod::Paytm => "Paytm",
            PaymentMethod::Credit => "Udhaar (Credit)",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the shop's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Merchant this product belongs to.
    pub merchant_id: String,

    /// Display name shown on bills.
    pub name: String,

    /// Purchase cost in paise (for profit calculations).
    pub cost_price_paise: i64,

    /// Selling price in paise.
    pub selling_price_paise: i64,

    /// Current stock level. Whether it may go negative is a policy decision
    /// made by the inventory service, not by this type.
    pub stock: i64,

    /// Product category (Staples, Oils, Snacks, ...).
    pub category: String,

    /// GST rate in basis points, if the product attracts GST.
    pub gst_bps: Option<u32>,

    /// Barcode (EAN-13, UPC-A, etc.), unique when present.
    pub barcode: Option<String>,

    /// Optional reference to a product image.
    pub image_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_paise(self.selling_price_paise)
    }

    /// Cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_paise(self.cost_price_paise)
    }

    /// Legacy alias for the selling price (the original data model exposed
    /// both `price` and `sellingPrice`).
    #[inline]
    pub fn price(&self) -> Money {
        self.selling_price()
    }

    /// GST rate, if any.
    #[inline]
    pub fn gst_rate(&self) -> Option<GstRate> {
        self.gst_bps.map(GstRate::from_bps)
    }

    /// Whether stock has fallen below the given threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

// =============================================================================
// Customer & Dues (the khata)
// =============================================================================

/// A line of an itemized due breakdown.
///
/// `price_paise` is the line total (unit price × quantity), matching how
/// bills are itemized on the due record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueItem {
    pub name: String,
    pub quantity: i64,
    pub price_paise: i64,
}

/// A single udhaar entry owed by a customer.
///
/// Created by a credit sale or a manual entry; the only mutation ever
/// applied is the one-way `paid` transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDue {
    pub id: String,

    /// Owning customer.
    pub customer_id: String,

    /// Amount owed, always > 0.
    pub amount_paise: i64,

    /// Human description, e.g. `Bill #4821 • 3 item(s)`.
    pub description: String,

    /// Optional itemized breakdown of what was bought on credit.
    pub items: Option<Vec<DueItem>>,

    /// Date the due was incurred.
    pub due_date: NaiveDate,

    /// One-way flag: once settled, a due never becomes unpaid again.
    pub paid: bool,

    pub created_at: DateTime<Utc>,
}

impl CustomerDue {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

/// A customer with a running credit balance.
///
/// Invariant: `balance == Σ(amount of unpaid dues)`, maintained by the
/// credit ledger service (settlement clamps the balance at zero, so a
/// drifted balance can only converge toward the invariant, never cross it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub merchant_id: String,
    pub name: String,

    /// Phone number, used as the messaging handle for reminders.
    pub phone: String,

    /// Signed balance in paise; positive means the customer owes the shop.
    pub balance_paise: i64,

    /// Date of the customer's most recent transaction.
    pub last_transaction_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_paise(self.balance_paise)
    }

    /// Whether the customer currently owes the shop anything.
    #[inline]
    pub fn has_due(&self) -> bool {
        self.balance_paise > 0
    }

    /// The portion of this balance that counts toward total receivables.
    /// Overpaid (negative) balances contribute nothing.
    #[inline]
    pub fn receivable(&self) -> Money {
        self.balance().clamp_at_zero()
    }
}

// =============================================================================
// Vendor & Bills (the payables side)
// =============================================================================

/// A purchase bill received from a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorBill {
    pub id: String,

    /// Owning vendor.
    pub vendor_id: String,

    /// Date on the bill.
    pub bill_date: NaiveDate,

    /// Bill amount, always > 0.
    pub amount_paise: i64,

    /// Free-text description of what was purchased.
    pub items_description: String,

    /// Optional reference to a receipt image.
    pub receipt_ref: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl VendorBill {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

/// A supplier the shop buys from.
///
/// Invariant: `balance == opening balance + Σ(bill amounts) − Σ(payments)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub category: String,

    /// Amount the shop owes this vendor, in paise.
    pub balance_paise: i64,

    /// When the next payment to this vendor falls due.
    pub next_payment_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
}

impl Vendor {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_paise(self.balance_paise)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A snapshot of one cart line, frozen into the transaction record so
/// historical cost/profit can be recomputed after product edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_paise: i64,
    pub discount_paise: i64,
    pub line_total_paise: i64,
}

/// A completed sale. Immutable once created; history is append-only and
/// retrieved most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub merchant_id: String,

    /// Weak reference to the customer; `None` for guest sales.
    pub customer_id: Option<String>,

    /// Customer name at the time of sale ("Guest" when anonymous).
    pub customer_name: String,

    /// Total charged, in paise.
    pub amount_paise: i64,

    pub payment_method: PaymentMethod,

    /// Number of cart lines on the bill.
    pub items_count: i64,

    /// Short display code (last 4 digits of the creation timestamp).
    pub bill_id: String,

    /// Optional frozen cart snapshot.
    pub items: Option<Vec<TransactionItem>>,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A recorded business expense.
///
/// An expense may reference a vendor for bookkeeping, but recording one
/// never mutates that vendor's payable balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub merchant_id: String,
    pub amount_paise: i64,
    pub category: String,
    pub description: String,
    pub expense_date: NaiveDate,
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Merchant Profile
// =============================================================================

/// Shop identity, used to compose payment QR requests and reminders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub merchant_id: String,
    pub shop_name: String,
    pub owner_name: String,
    pub upi_id: String,
    pub phone: String,
    pub address: String,
}

// =============================================================================
// Weekly Sales Buckets
// =============================================================================

/// Sales total for one weekday of the rolling week.
///
/// `weekday` is 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySales {
    pub weekday: u8,
    pub amount_paise: i64,
}

impl DaySales {
    /// Short weekday label, as shown on the sales chart.
    pub fn label(&self) -> &'static str {
        match self.weekday {
            0 => "Mon",
            1 => "Tue",
            2 => "Wed",
            3 => "Thu",
            4 => "Fri",
            5 => "Sat",
            _ => "Sun",
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paise(self.amount_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gst_rate_conversions() {
        let rate = GstRate::from_bps(1800);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);

        assert_eq!(GstRate::from_percentage(18.0).bps(), 1800);
        assert!(GstRate::default().is_zero());
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Cash.to_string(), "Cash");
        assert_eq!(PaymentMethod::Upi.to_string(), "UPI");
        assert_eq!(PaymentMethod::Credit.to_string(), "Udhaar (Credit)");
    }

    #[test]
    fn test_payment_method_checks() {
        assert!(PaymentMethod::Credit.is_credit());
        assert!(!PaymentMethod::Cash.is_credit());
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Upi.is_cash());
    }

    #[test]
    fn test_customer_receivable_excludes_overpayment() {
        let mut customer = Customer {
            id: "c1".into(),
            merchant_id: crate::DEFAULT_MERCHANT_ID.into(),
            name: "Rahul".into(),
            phone: "9876543210".into(),
            balance_paise: 45000,
            last_transaction_date: None,
            created_at: Utc::now(),
        };
        assert!(customer.has_due());
        assert_eq!(customer.receivable().paise(), 45000);

        customer.balance_paise = -500;
        assert!(!customer.has_due());
        assert_eq!(customer.receivable(), Money::zero());
    }

    #[test]
    fn test_day_sales_labels() {
        assert_eq!(DaySales { weekday: 0, amount_paise: 0 }.label(), "Mon");
        assert_eq!(DaySales { weekday: 6, amount_paise: 0 }.label(), "Sun");
    }
}

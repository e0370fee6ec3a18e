//! # Money Module
//!
//! Monetary values as integer paise (the smallest rupee unit).
//!
//! Floating point is never used for money: `0.1 + 0.2` is not `0.3` and a
//! ledger that drifts by a paisa per bill is a ledger nobody trusts. Every
//! amount in the system, from product prices to customer balances, flows
//! through this type; only a UI converts to rupees for display.
//!
//! ## Usage
//! ```rust
//! use dhandha_core::money::Money;
//!
//! let price = Money::from_rupees(145);       // Rs 145.00
//! let total = price * 2;                     // Rs 290.00
//! assert_eq!(total.paise(), 29000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::GstRate;

/// A monetary value in paise.
///
/// Signed so refunds, discounts, and overpaid balances are representable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of self and `other`.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// Clamps a balance at the zero floor.
    ///
    /// Used when settling dues: a settlement must never push a balance
    /// negative, even if the stored balance has drifted below the due sum.
    #[inline]
    pub fn clamp_at_zero(self) -> Self {
        Money(self.0.max(0))
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates the GST portion of this amount.
    ///
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// Uses i128 internally so large bills cannot overflow.
    pub fn calculate_gst(&self, rate: GstRate) -> Money {
        let gst = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_paise(gst as i64)
    }
}

/// Debug-friendly display: `₹145.00`, `-₹5.50`.
///
/// UI localization is out of scope here; this is for logs and receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

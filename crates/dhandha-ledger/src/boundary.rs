//! # External Boundary Contracts
//!
//! Traits for the collaborators the ledger consumes but never implements:
//! camera/scanner hardware, payment QR rendering, messaging channels, the
//! business advisor, and the session provider. The ledger only composes
//! their inputs (UPI request strings, reminder text, advisor summaries);
//! real integrations live outside this workspace.

use thiserror::Error;

use dhandha_core::{Customer, DaySales, Money};

// =============================================================================
// Code Scanner
// =============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// No decodable code in view.
    #[error("no code found")]
    NotFound,

    /// Camera access was denied.
    #[error("camera permission denied")]
    PermissionDenied,
}

/// Yields a decoded barcode/QR payload string. The ledger resolves the
/// string against product ID or barcode.
pub trait CodeScanner {
    fn scan(&self) -> Result<String, ScanError>;
}

// =============================================================================
// Payment QR
// =============================================================================

/// A UPI collect request, composed from the merchant profile and a bill
/// total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpiPaymentRequest {
    pub payee_upi_id: String,
    pub payee_name: String,
    pub amount: Money,
}

impl UpiPaymentRequest {
    /// Composes a collect request for a bill from the merchant profile.
    pub fn for_bill(profile: &dhandha_core::MerchantProfile, amount: Money) -> Self {
        UpiPaymentRequest {
            payee_upi_id: profile.upi_id.clone(),
            payee_name: profile.shop_name.clone(),
            amount,
        }
    }

    /// Renders the standard UPI deep link:
    /// `upi://pay?pa=<id>&pn=<name>&am=<rupees.paise>&tn=BillPayment`.
    pub fn to_uri(&self) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}.{:02}&tn=BillPayment",
            percent_encode(&self.payee_upi_id),
            percent_encode(&self.payee_name),
            self.amount.rupees(),
            self.amount.paise_part(),
        )
    }
}

/// Minimal query-component encoding: unreserved ASCII passes through,
/// everything else becomes %XX per byte.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'@' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[derive(Debug, Error)]
pub enum QrError {
    #[error("qr generation failed: {0}")]
    Failed(String),
}

/// Turns a payment request into a scannable image reference.
pub trait PaymentQrGenerator {
    fn generate(&self, request: &UpiPaymentRequest) -> Result<String, QrError>;
}

// =============================================================================
// Messaging
// =============================================================================

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("message dispatch failed: {0}")]
    Failed(String),
}

/// Opens an external channel (e.g. a WhatsApp deep link) to a phone
/// number with prepared text.
pub trait MessagingDispatcher {
    fn dispatch(&self, phone: &str, message: &str) -> Result<(), DispatchError>;
}

/// The balance reminder sent to a customer with an outstanding khata.
pub fn compose_balance_reminder(customer: &Customer) -> String {
    format!(
        "Namaste {} Ji, your current pending amount at our store is {}. \
         Please pay at your earliest convenience. Thank you!",
        customer.name,
        customer.balance(),
    )
}

// =============================================================================
// Business Advisor
// =============================================================================

/// The snapshot handed to the advisor.
#[derive(Debug, Clone)]
pub struct AdvisorInput {
    pub weekly_sales: Vec<DaySales>,
    pub total_receivables: Money,
    pub total_payables: Money,
}

/// Returns a short natural-language business summary. Best-effort: a
/// failure here never blocks a ledger operation, so the contract returns
/// a plain string either way.
pub trait BusinessAdvisor {
    fn advise(&self, input: &AdvisorInput) -> String;
}

// =============================================================================
// Session Provider
// =============================================================================

/// Supplies the opaque merchant ID used to namespace the store. The
/// ledger knows nothing about how sessions are established.
pub trait SessionProvider {
    fn merchant_id(&self) -> String;
}

// =============================================================================
// Unit Tests
// =============================================================================

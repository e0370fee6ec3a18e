//! # Ledger Configuration
//!
//! Policy knobs for the services: whether a sale may oversell stock, and
//! the low-stock warning threshold.

use dhandha_core::LOW_STOCK_THRESHOLD;

/// What happens when a sale asks for more units than are in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Selling below zero fails with `InsufficientStock`.
    #[default]
    BlockOversell,

    /// Stock may go negative (backorder semantics).
    AllowNegative,
}

/// Ledger service configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub stock_policy: StockPolicy,

    /// Stock below this count shows as "low stock". Default: 20.
    pub low_stock_threshold: i64,
}

impl LedgerConfig {
    pub fn new() -> Self {
        LedgerConfig {
            stock_policy: StockPolicy::BlockOversell,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        }
    }

    pub fn stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig::new()
    }
}

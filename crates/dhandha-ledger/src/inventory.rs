//! # Inventory Service
//!
//! Product CRUD and stock movement outside of checkout: manual
//! adjustments, stock receipts, low-stock listing, and scan resolution.

use chrono::Utc;
use tracing::{debug, info};

use dhandha_core::{validation, Product};
use dhandha_db::{new_id, Database};

use crate::config::{LedgerConfig, StockPolicy};
use crate::error::{LedgerError, LedgerResult};

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub cost_price_paise: i64,
    pub selling_price_paise: i64,
    pub stock: i64,
    pub category: String,
    pub gst_bps: Option<u32>,
    pub barcode: Option<String>,
    pub image_ref: Option<String>,
}

/// Inventory operations.
#[derive(Debug, Clone)]
pub struct Inventory {
    db: Database,
    config: LedgerConfig,
    merchant_id: String,
}

impl Inventory {
    pub fn new(db: Database, config: LedgerConfig, merchant_id: impl Into<String>) -> Self {
        Inventory {
            db,
            config,
            merchant_id: merchant_id.into(),
        }
    }

    pub async fn list(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list(&self.merchant_id).await?)
    }

    pub async fn get(&self, id: &str) -> LedgerResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", id))
    }

    /// Resolves a scanned code against product ID or barcode.
    pub async fn find_by_scan(&self, code: &str) -> LedgerResult<Product> {
        self.db
            .products()
            .get_by_scan(code)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", code))
    }

    pub async fn create_product(&self, new: NewProduct) -> LedgerResult<Product> {
        validation::validate_name(&new.name)?;
        validation::validate_price_paise(new.cost_price_paise)?;
        validation::validate_price_paise(new.selling_price_paise)?;
        if let Some(bps) = new.gst_bps {
            validation::validate_gst_bps(bps)?;
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            merchant_id: self.merchant_id.clone(),
            name: new.name,
            cost_price_paise: new.cost_price_paise,
            selling_price_paise: new.selling_price_paise,
            stock: new.stock,
            category: new.category,
            gst_bps: new.gst_bps,
            barcode: new.barcode,
            image_ref: new.image_ref,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        self.db.products().insert(&mut tx, &product).await?;
        crate::commit(tx).await?;

        info!(id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, product: &Product) -> LedgerResult<()> {
        validation::validate_name(&product.name)?;
        validation::validate_price_paise(product.selling_price_paise)?;

        let mut tx = self.db.begin().await?;
        self.db.products().update(&mut tx, product).await?;
        crate::commit(tx).await?;
        Ok(())
    }

    pub async fn delete_product(&self, id: &str) -> LedgerResult<()> {
        let mut tx = self.db.begin().await?;
        self.db.products().delete(&mut tx, id).await?;
        crate::commit(tx).await?;

        info!(id = %id, "product deleted");
        Ok(())
    }

    /// Applies a stock delta: negative for a correction or sale outside
    /// checkout, positive for an adjustment upward. Honors the stock
    /// policy for negative deltas.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> LedgerResult<i64> {
        let products = self.db.products();
        let mut tx = self.db.begin().await?;

        let product = products
            .get_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", id))?;

        let new_stock = product.stock + delta;
        if self.config.stock_policy == StockPolicy::BlockOversell && new_stock < 0 {
            return Err(LedgerError::InsufficientStock {
                product_id: id.to_string(),
                requested: -delta,
                available: product.stock,
            });
        }

        products.adjust_stock(&mut tx, id, delta).await?;
        crate::commit(tx).await?;

        debug!(id = %id, delta, new_stock, "stock adjusted");
        Ok(new_stock)
    }

    /// Restocking: always additive.
    pub async fn receive_stock(&self, id: &str, quantity: i64) -> LedgerResult<i64> {
        if quantity <= 0 {
            return Err(dhandha_core::ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        self.adjust_stock(id, quantity).await
    }

    /// Products below the configured low-stock threshold.
    pub async fn low_stock(&self) -> LedgerResult<Vec<Product>> {
        Ok(self
            .db
            .products()
            .low_stock(&self.merchant_id, self.config.low_stock_threshold)
            .await?)
    }
}

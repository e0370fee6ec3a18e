//! # Vendor Payables
//!
//! Suppliers, their purchase bills, and payments against the balance.
//! Bills raise the vendor balance; payments lower it with a zero floor.

use chrono::{NaiveDate, Utc};
use tracing::info;

use dhandha_core::{validation, Money, Vendor, VendorBill};
use dhandha_db::{new_id, Database};

use crate::error::{LedgerError, LedgerResult};

/// Fields for creating a vendor.
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub name: String,
    pub phone: Option<String>,
    pub category: String,
    pub opening_balance: Money,
    pub next_payment_date: Option<NaiveDate>,
}

/// Vendor payable operations.
#[derive(Debug, Clone)]
pub struct VendorPayables {
    db: Database,
    merchant_id: String,
}

impl VendorPayables {
    pub fn new(db: Database, merchant_id: impl Into<String>) -> Self {
        VendorPayables {
            db,
            merchant_id: merchant_id.into(),
        }
    }

    pub async fn list(&self) -> LedgerResult<Vec<Vendor>> {
        Ok(self.db.vendors().list(&self.merchant_id).await?)
    }

    pub async fn get(&self, id: &str) -> LedgerResult<Vendor> {
        self.db
            .vendors()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Vendor", id))
    }

    pub async fn bills(&self, vendor_id: &str) -> LedgerResult<Vec<VendorBill>> {
        Ok(self.db.vendors().bills(vendor_id).await?)
    }

    pub async fn create_vendor(&self, new: NewVendor) -> LedgerResult<Vendor> {
        validation::validate_name(&new.name)?;
        if let Some(phone) = &new.phone {
            validation::validate_phone(phone)?;
        }
        validation::validate_price_paise(new.opening_balance.paise())?;

        let vendor = Vendor {
            id: new_id(),
            merchant_id: self.merchant_id.clone(),
            name: new.name.trim().to_string(),
            phone: new.phone,
            category: new.category,
            balance_paise: new.opening_balance.paise(),
            next_payment_date: new.next_payment_date,
            created_at: Utc::now(),
        };

        let mut tx = self.db.begin().await?;
        self.db.vendors().insert(&mut tx, &vendor).await?;
        crate::commit(tx).await?;

        info!(id = %vendor.id, name = %vendor.name, "vendor created");
        Ok(vendor)
    }

    /// Ad hoc vendor creation during expense entry. The resulting vendor
    /// is indistinguishable from one created directly: no bills, balance
    /// zero.
    pub async fn create_vendor_from_expense(
        &self,
        name: &str,
        category: &str,
    ) -> LedgerResult<Vendor> {
        self.create_vendor(NewVendor {
            name: name.to_string(),
            phone: None,
            category: category.to_string(),
            opening_balance: Money::zero(),
            next_payment_date: None,
        })
        .await
    }

    /// Records a purchase bill: appends the bill and raises the balance
    /// in one transaction.
    pub async fn record_bill(
        &self,
        vendor_id: &str,
        amount: Money,
        items_description: &str,
        bill_date: NaiveDate,
        receipt_ref: Option<String>,
    ) -> LedgerResult<VendorBill> {
        validation::validate_amount_paise(amount.paise())?;

        let vendors = self.db.vendors();

        let mut tx = self.db.begin().await?;

        let vendor = vendors
            .get_for_update(&mut tx, vendor_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Vendor", vendor_id))?;

        let bill = VendorBill {
            id: new_id(),
            vendor_id: vendor.id.clone(),
            bill_date,
            amount_paise: amount.paise(),
            items_description: items_description.to_string(),
            receipt_ref,
            created_at: Utc::now(),
        };

        vendors.insert_bill(&mut tx, &bill).await?;
        vendors.add_balance(&mut tx, &vendor.id, amount.paise()).await?;

        crate::commit(tx).await?;

        info!(
            vendor_id = %vendor.id,
            bill_id = %bill.id,
            amount_paise = amount.paise(),
            "vendor bill recorded"
        );
        Ok(bill)
    }

    /// Records a payment to a vendor, lowering the balance with a zero
    /// floor. Returns the updated vendor.
    pub async fn record_payment(&self, vendor_id: &str, amount: Money) -> LedgerResult<Vendor> {
        validation::validate_amount_paise(amount.paise())?;

        let vendors = self.db.vendors();

        let mut tx = self.db.begin().await?;

        vendors
            .get_for_update(&mut tx, vendor_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Vendor", vendor_id))?;

        vendors
            .subtract_balance_clamped(&mut tx, vendor_id, amount.paise())
            .await?;

        crate::commit(tx).await?;

        let vendor = self.get(vendor_id).await?;
        info!(
            vendor_id = %vendor_id,
            amount_paise = amount.paise(),
            balance_paise = vendor.balance_paise,
            "vendor payment recorded"
        );
        Ok(vendor)
    }

    pub async fn delete_vendor(&self, id: &str) -> LedgerResult<()> {
        let mut tx = self.db.begin().await?;
        self.db.vendors().delete(&mut tx, id).await?;
        crate::commit(tx).await?;
        Ok(())
    }

    /// Raw sum of vendor balances.
    pub async fn total_payables(&self) -> LedgerResult<Money> {
        let paise = self.db.vendors().total_payables(&self.merchant_id).await?;
        Ok(Money::from_paise(paise))
    }
}

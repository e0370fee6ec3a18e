//! # Shop Repository
//!
//! Merchant-level state: the cash drawer, the rolling weekly sales
//! buckets, and the merchant profile used for payment requests and
//! reminders.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dhandha_core::{DaySales, MerchantProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    merchant_id: String,
    shop_name: String,
    owner_name: String,
    upi_id: String,
    phone: String,
    address: String,
}

impl From<ProfileRow> for MerchantProfile {
    fn from(row: ProfileRow) -> Self {
        MerchantProfile {
            merchant_id: row.merchant_id,
            shop_name: row.shop_name,
            owner_name: row.owner_name,
            upi_id: row.upi_id,
            phone: row.phone,
            address: row.address,
        }
    }
}

/// Repository for merchant-level shop state.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    // =========================================================================
    // Cash drawer
    // =========================================================================

    /// Cash in hand for a merchant. Zero when no drawer row exists yet.
    pub async fn cash_in_hand(&self, merchant_id: &str) -> DbResult<i64> {
        let cash: Option<i64> = sqlx::query_scalar(
            "SELECT cash_in_hand_paise FROM cash_registers WHERE merchant_id = ?1",
        )
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cash.unwrap_or(0))
    }

    /// Moves cash in or out of the drawer. Negative for a payout.
    pub async fn add_cash(
        &self,
        conn: &mut SqliteConnection,
        merchant_id: &str,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(merchant_id = %merchant_id, amount_paise, "moving cash drawer");

        sqlx::query(
            "INSERT INTO cash_registers (merchant_id, cash_in_hand_paise)
             VALUES (?1, ?2)
             ON CONFLICT (merchant_id)
             DO UPDATE SET cash_in_hand_paise = cash_in_hand_paise + ?2",
        )
        .bind(merchant_id)
        .bind(amount_paise)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Weekly sales buckets
    // =========================================================================

    /// The seven weekday buckets, Monday through Sunday, zero-filled for
    /// days with no sales yet.
    pub async fn weekly_sales(&self, merchant_id: &str) -> DbResult<Vec<DaySales>> {
        #[derive(sqlx::FromRow)]
        struct BucketRow {
            weekday: i64,
            amount_paise: i64,
        }

        let rows: Vec<BucketRow> = sqlx::query_as(
            "SELECT weekday, amount_paise FROM sales_by_day
             WHERE merchant_id = ?1 ORDER BY weekday",
        )
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut buckets: Vec<DaySales> = (0..7)
            .map(|weekday| DaySales {
                weekday,
                amount_paise: 0,
            })
            .collect();

        for row in rows {
            if let Some(bucket) = buckets.get_mut(row.weekday as usize) {
                bucket.amount_paise = row.amount_paise;
            }
        }

        Ok(buckets)
    }

    /// Adds a sale amount to one weekday bucket (0 = Monday .. 6 = Sunday).
    pub async fn bump_day_sales(
        &self,
        conn: &mut SqliteConnection,
        merchant_id: &str,
        weekday: u8,
        amount_paise: i64,
    ) -> DbResult<()> {
        debug!(merchant_id = %merchant_id, weekday, amount_paise, "bumping day sales");

        sqlx::query(
            "INSERT INTO sales_by_day (merchant_id, weekday, amount_paise)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (merchant_id, weekday)
             DO UPDATE SET amount_paise = amount_paise + ?3",
        )
        .bind(merchant_id)
        .bind(weekday as i64)
        .bind(amount_paise)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Merchant profile
    // =========================================================================

    pub async fn profile(&self, merchant_id: &str) -> DbResult<Option<MerchantProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT merchant_id, shop_name, owner_name, upi_id, phone, address
             FROM merchant_profiles WHERE merchant_id = ?1",
        )
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MerchantProfile::from))
    }

    pub async fn upsert_profile(
        &self,
        conn: &mut SqliteConnection,
        profile: &MerchantProfile,
    ) -> DbResult<()> {
        debug!(merchant_id = %profile.merchant_id, "upserting merchant profile");

        sqlx::query(
            "INSERT INTO merchant_profiles (
                merchant_id, shop_name, owner_name, upi_id, phone, address
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (merchant_id)
             DO UPDATE SET shop_name = ?2, owner_name = ?3, upi_id = ?4,
                           phone = ?5, address = ?6",
        )
        .bind(&profile.merchant_id)
        .bind(&profile.shop_name)
        .bind(&profile.owner_name)
        .bind(&profile.upi_id)
        .bind(&profile.phone)
        .bind(&profile.address)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use dhandha_core::{MerchantProfile, DEFAULT_MERCHANT_ID};

    use crate::repository::testing::memory_db;

    #[tokio::test]
    async fn test_cash_drawer_defaults_to_zero_and_accumulates() {
        let db = memory_db().await;
        let repo = db.shop();

        assert_eq!(repo.cash_in_hand(DEFAULT_MERCHANT_ID).await.unwrap(), 0);

        let mut tx = db.begin().await.unwrap();
        repo.add_cash(&mut tx, DEFAULT_MERCHANT_ID, 25000)
            .await
            .unwrap();
        repo.add_cash(&mut tx, DEFAULT_MERCHANT_ID, -5000)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            repo.cash_in_hand(DEFAULT_MERCHANT_ID).await.unwrap(),
            20000
        );
    }

    #[tokio::test]
    async fn test_weekly_sales_fills_all_seven_buckets() {
        let db = memory_db().await;
        let repo = db.shop();

        let mut tx = db.begin().await.unwrap();
        repo.bump_day_sales(&mut tx, DEFAULT_MERCHANT_ID, 0, 10000)
            .await
            .unwrap();
        repo.bump_day_sales(&mut tx, DEFAULT_MERCHANT_ID, 0, 5000)
            .await
            .unwrap();
        repo.bump_day_sales(&mut tx, DEFAULT_MERCHANT_ID, 6, 2000)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let buckets = repo.weekly_sales(DEFAULT_MERCHANT_ID).await.unwrap();
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].amount_paise, 15000);
        assert_eq!(buckets[3].amount_paise, 0);
        assert_eq!(buckets[6].amount_paise, 2000);
        assert_eq!(buckets[0].label(), "Mon");
    }

    #[tokio::test]
    async fn test_profile_upsert_round_trip() {
        let db = memory_db().await;
        let repo = db.shop();

        let mut profile = MerchantProfile {
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            shop_name: "Sharma General Store".to_string(),
            owner_name: "Ramesh Sharma".to_string(),
            upi_id: "sharma@upi".to_string(),
            phone: "9876543210".to_string(),
            address: "Main Bazaar".to_string(),
        };

        let mut tx = db.begin().await.unwrap();
        repo.upsert_profile(&mut tx, &profile).await.unwrap();
        tx.commit().await.unwrap();

        profile.upi_id = "sharma2@upi".to_string();
        let mut tx = db.begin().await.unwrap();
        repo.upsert_profile(&mut tx, &profile).await.unwrap();
        tx.commit().await.unwrap();

        let fetched = repo.profile(DEFAULT_MERCHANT_ID).await.unwrap().unwrap();
        assert_eq!(fetched.upi_id, "sharma2@upi");
        assert_eq!(fetched.shop_name, "Sharma General Store");
    }
}

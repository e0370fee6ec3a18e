//! Cross-repository transaction behavior: several aggregates moving under
//! one transaction commit together or not at all.

use chrono::Utc;
use dhandha_core::{
    Customer, CustomerDue, PaymentMethod, Product, Transaction, DEFAULT_MERCHANT_ID,
};
use dhandha_db::{new_id, Database, DbConfig};

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

fn product(id: &str, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        merchant_id: DEFAULT_MERCHANT_ID.to_string(),
        name: format!("Product {id}"),
        cost_price_paise: 5000,
        selling_price_paise: 10000,
        stock,
        category: "Staples".to_string(),
        gst_bps: None,
        barcode: None,
        image_ref: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn customer(id: &str) -> Customer {
    Customer {
        id: id.to_string(),
        merchant_id: DEFAULT_MERCHANT_ID.to_string(),
        name: format!("Customer {id}"),
        phone: "9876543210".to_string(),
        balance_paise: 0,
        last_transaction_date: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn dropped_transaction_rolls_back_every_aggregate() {
    let db = memory_db().await;

    let mut tx = db.begin().await.unwrap();
    db.products().insert(&mut tx, &product("p1", 50)).await.unwrap();
    db.customers().insert(&mut tx, &customer("c1")).await.unwrap();
    tx.commit().await.unwrap();

    // A checkout-shaped write sequence, abandoned before commit.
    {
        let mut tx = db.begin().await.unwrap();
        db.products().adjust_stock(&mut tx, "p1", -2).await.unwrap();
        db.customers().add_balance(&mut tx, "c1", 20000).await.unwrap();
        db.customers()
            .insert_due(
                &mut tx,
                &CustomerDue {
                    id: new_id(),
                    customer_id: "c1".to_string(),
                    amount_paise: 20000,
                    description: "Bill #0001 \u{2022} 1 item(s)".to_string(),
                    items: None,
                    due_date: Utc::now().date_naive(),
                    paid: false,
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        db.shop()
            .add_cash(&mut tx, DEFAULT_MERCHANT_ID, 20000)
            .await
            .unwrap();
        // Dropped here.
    }

    let p1 = db.products().get_by_id("p1").await.unwrap().unwrap();
    assert_eq!(p1.stock, 50);

    let c1 = db.customers().get_by_id("c1").await.unwrap().unwrap();
    assert_eq!(c1.balance_paise, 0);
    assert!(db.customers().dues("c1").await.unwrap().is_empty());

    assert_eq!(db.shop().cash_in_hand(DEFAULT_MERCHANT_ID).await.unwrap(), 0);
}

#[tokio::test]
async fn committed_transaction_applies_every_aggregate() {
    let db = memory_db().await;

    let mut tx = db.begin().await.unwrap();
    db.products().insert(&mut tx, &product("p1", 50)).await.unwrap();
    db.customers().insert(&mut tx, &customer("c1")).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    db.products().adjust_stock(&mut tx, "p1", -2).await.unwrap();
    db.customers().add_balance(&mut tx, "c1", 20000).await.unwrap();
    db.transactions()
        .insert(
            &mut tx,
            &Transaction {
                id: new_id(),
                merchant_id: DEFAULT_MERCHANT_ID.to_string(),
                customer_id: Some("c1".to_string()),
                customer_name: "Customer c1".to_string(),
                amount_paise: 20000,
                payment_method: PaymentMethod::Credit,
                items_count: 1,
                bill_id: "0001".to_string(),
                items: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    db.shop()
        .bump_day_sales(&mut tx, DEFAULT_MERCHANT_ID, 0, 20000)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let p1 = db.products().get_by_id("p1").await.unwrap().unwrap();
    assert_eq!(p1.stock, 48);

    let c1 = db.customers().get_by_id("c1").await.unwrap().unwrap();
    assert_eq!(c1.balance_paise, 20000);

    let recent = db
        .transactions()
        .list_recent(DEFAULT_MERCHANT_ID, 10)
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].payment_method, PaymentMethod::Credit);

    let weekly = db.shop().weekly_sales(DEFAULT_MERCHANT_ID).await.unwrap();
    assert_eq!(weekly[0].amount_paise, 20000);
}

#[tokio::test]
async fn deleting_a_customer_keeps_transaction_history() {
    let db = memory_db().await;

    let mut tx = db.begin().await.unwrap();
    db.customers().insert(&mut tx, &customer("c1")).await.unwrap();
    db.transactions()
        .insert(
            &mut tx,
            &Transaction {
                id: "t1".to_string(),
                merchant_id: DEFAULT_MERCHANT_ID.to_string(),
                customer_id: Some("c1".to_string()),
                customer_name: "Customer c1".to_string(),
                amount_paise: 5000,
                payment_method: PaymentMethod::Cash,
                items_count: 1,
                bill_id: "0002".to_string(),
                items: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    db.customers().delete(&mut tx, "c1").await.unwrap();
    tx.commit().await.unwrap();

    // Weak reference: the sale record survives with its name snapshot.
    let t1 = db.transactions().get_by_id("t1").await.unwrap().unwrap();
    assert_eq!(t1.customer_name, "Customer c1");
    assert_eq!(t1.customer_id.as_deref(), Some("c1"));
}

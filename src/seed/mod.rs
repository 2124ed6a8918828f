use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::db::{OrderStore, PolicyStore, ProductItemStore, ProductStore, Store};
use crate::error::AppResult;
use crate::models::*;

static CATEGORIES: &[&str] = &[
    "Electronics",
    "Home & Garden",
    "Toys & Games",
    "Sports & Outdoors",
    "Automotive",
    "Office Supplies",
    "Musical Instruments",
    "Tools & Hardware",
];

static ADJECTIVES: &[&str] = &[
    "Premium", "Deluxe", "Ultra", "Pro", "Classic", "Smart", "Compact", "Portable",
    "Heavy-Duty", "Lightweight", "Advanced", "Essential", "Turbo", "Silent",
];

static NOUNS: &[&str] = &[
    "Widget", "Gadget", "Console", "Sensor", "Controller", "Adapter", "Monitor",
    "Scanner", "Receiver", "Amplifier", "Regulator",
];

/// (policy type, duration in days) offered on every seeded product.
static POLICIES: &[(&str, i32)] = &[("7-day", 7), ("30-day", 30)];

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub products: usize,
    pub items: usize,
    pub policies: usize,
    pub orders: usize,
}

/// Generate a random product name using adjective + noun + serial suffix.
fn random_product_name(rng: &mut impl Rng, serial: usize) -> String {
    let adj = ADJECTIVES.choose(rng).unwrap_or(&"Standard");
    let noun = NOUNS.choose(rng).unwrap_or(&"Widget");
    format!("{} {} #{:05}", adj, noun, serial)
}

/// Seed `count` products, each with serial-numbered units, return policies
/// and one delivered order for its first unit.
pub async fn seed_catalog(store: &dyn Store, count: usize) -> AppResult<SeedSummary> {
    info!("Seeding {} products...", count);

    // StdRng is Send + Sync, safe to hold across await points
    let mut rng = StdRng::from_entropy();
    let mut summary = SeedSummary::default();

    for i in 0..count {
        let product = store
            .add_product(&CreateProduct {
                name: random_product_name(&mut rng, i),
                description: rng
                    .gen_bool(0.7)
                    .then(|| "Refurbishable unit, tracked by serial number".to_string()),
                price_cents: rng.gen_range(99..=999_99), // $0.99 – $999.99
                category: CATEGORIES.choose(&mut rng).unwrap_or(&"Electronics").to_string(),
            })
            .await?;
        summary.products += 1;

        let unit_count = rng.gen_range(2..=6);
        let mut sold_serial = None;
        for n in 0..unit_count {
            let serial_number = format!("SN-{:05}-{:03}", product.id, n);
            let status = if n == 0 {
                ItemStatus::Sold
            } else {
                ItemStatus::Available
            };
            store
                .add_item(
                    product.id,
                    &CreateProductItem {
                        serial_number: serial_number.clone(),
                        status: Some(status),
                    },
                )
                .await?;
            if n == 0 {
                sold_serial = Some(serial_number);
            }
            summary.items += 1;
        }

        for (policy_type, duration_days) in POLICIES {
            store
                .add_policy(
                    product.id,
                    &CreatePolicy {
                        policy_type: policy_type.to_string(),
                        duration_days: *duration_days,
                    },
                )
                .await?;
            summary.policies += 1;
        }

        if let Some(serial_number) = sold_serial {
            store
                .add_order(NewOrder {
                    user_id: rng.gen_range(1..=50),
                    status: OrderStatus::Delivered,
                    order_date: Utc::now() - Duration::days(rng.gen_range(0..=45)),
                    lines: vec![NewOrderLine {
                        product_id: product.id,
                        serial_number,
                        price_cents: product.price_cents,
                    }],
                })
                .await?;
            summary.orders += 1;
        }
    }

    info!(
        products = summary.products,
        items = summary.items,
        orders = summary.orders,
        "Seeding complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    #[tokio::test]
    async fn seeded_orders_reference_sold_units() {
        let store = InMemoryStore::new();
        let summary = seed_catalog(&store, 3).await.unwrap();
        assert_eq!(summary.products, 3);
        assert_eq!(summary.orders, 3);
        assert_eq!(summary.policies, 3 * POLICIES.len());

        for order_id in 1..=3 {
            let order = store.get_order(order_id).await.unwrap().unwrap();
            assert_eq!(order.status, OrderStatus::Delivered);
            let line = &order.order_products[0];
            let item = store.get_item(&line.serial_number).await.unwrap().unwrap();
            assert_eq!(item.status, ItemStatus::Sold);
            assert_eq!(item.product_id, line.product_id);
        }
    }
}

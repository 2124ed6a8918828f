//! In-memory implementation of the store traits.
//!
//! All tables live behind one `RwLock`, so every trait call is atomic with
//! respect to the others. Data is lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    OrderStore, PolicyStore, ProductItemStore, ProductStore, ReturnRequestStore, TransactionStore,
};
use crate::error::{AppError, AppResult};
use crate::models::*;

#[derive(Debug, Default)]
struct Tables {
    requests: BTreeMap<i64, ReturnRequest>,
    orders: BTreeMap<i64, Order>,
    policies: BTreeMap<i64, Policy>,
    items: BTreeMap<i64, ProductItem>,
    transactions: BTreeMap<i64, Transaction>,
    products: BTreeMap<i64, Product>,
    next_line_id: i64,
}

/// Next key after the largest one in use.
fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order keeping its ids, replacing any order with the same id.
    pub async fn insert_order(&self, order: Order) -> Order {
        let mut tables = self.tables.write().await;
        if let Some(max_line) = order.order_products.iter().map(|l| l.id).max() {
            tables.next_line_id = tables.next_line_id.max(max_line);
        }
        tables.orders.insert(order.id, order.clone());
        order
    }

    /// Insert a product keeping its id.
    pub async fn insert_product(&self, product: Product) -> Product {
        let mut tables = self.tables.write().await;
        tables.products.insert(product.id, product.clone());
        product
    }
}

#[async_trait]
impl ReturnRequestStore for InMemoryStore {
    async fn get_request(&self, id: i64) -> AppResult<Option<ReturnRequest>> {
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn add_request(&self, new: NewReturnRequest) -> AppResult<ReturnRequest> {
        let mut tables = self.tables.write().await;
        let request = ReturnRequest {
            id: next_id(&tables.requests),
            user_id: new.user_id,
            order_id: new.order_id,
            product_id: new.product_id,
            serial_number: None,
            return_policy: new.return_policy,
            reason: new.reason,
            feedback: None,
            status: RequestStatus::Pending,
            process: None,
            request_date: new.request_date,
            closed_date: None,
            closed_by: None,
            in_review: false,
            version: 1,
        };
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_request(&self, request: &ReturnRequest) -> AppResult<ReturnRequest> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .requests
            .get_mut(&request.id)
            .ok_or(AppError::RequestNotFound(request.id))?;
        if stored.version != request.version {
            return Err(AppError::Conflict(request.id));
        }
        *stored = ReturnRequest {
            version: request.version + 1,
            ..request.clone()
        };
        Ok(stored.clone())
    }

    async fn find_requests(&self, filter: &ReturnRequestFilter) -> AppResult<Vec<ReturnRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get_order(&self, id: i64) -> AppResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn add_order(&self, new: NewOrder) -> AppResult<Order> {
        let mut tables = self.tables.write().await;
        let order_id = next_id(&tables.orders);
        let mut order_products = Vec::with_capacity(new.lines.len());
        for line in new.lines {
            tables.next_line_id += 1;
            order_products.push(OrderProduct {
                id: tables.next_line_id,
                order_id,
                product_id: line.product_id,
                serial_number: line.serial_number,
                price_cents: line.price_cents,
            });
        }
        let order = Order {
            id: order_id,
            user_id: new.user_id,
            status: new.status,
            order_date: new.order_date,
            order_products,
        };
        tables.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn update_order_product(&self, line: &OrderProduct) -> AppResult<OrderProduct> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .orders
            .get_mut(&line.order_id)
            .and_then(|order| order.order_products.iter_mut().find(|l| l.id == line.id))
            .ok_or(AppError::LineItemNotFound {
                order_id: line.order_id,
                product_id: line.product_id,
            })?;
        *stored = line.clone();
        Ok(stored.clone())
    }
}

#[async_trait]
impl PolicyStore for InMemoryStore {
    async fn find_policies(
        &self,
        product_id: i64,
        policy_type: Option<&str>,
    ) -> AppResult<Vec<Policy>> {
        let tables = self.tables.read().await;
        Ok(tables
            .policies
            .values()
            .filter(|p| p.product_id == product_id)
            .filter(|p| policy_type.map_or(true, |t| p.policy_type == t))
            .cloned()
            .collect())
    }

    async fn add_policy(&self, product_id: i64, payload: &CreatePolicy) -> AppResult<Policy> {
        let mut tables = self.tables.write().await;
        let policy = Policy {
            id: next_id(&tables.policies),
            product_id,
            policy_type: payload.policy_type.clone(),
            duration_days: payload.duration_days,
        };
        tables.policies.insert(policy.id, policy.clone());
        Ok(policy)
    }
}

#[async_trait]
impl ProductItemStore for InMemoryStore {
    async fn get_item(&self, serial_number: &str) -> AppResult<Option<ProductItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.serial_number == serial_number)
            .cloned())
    }

    async fn find_items(
        &self,
        product_id: i64,
        status: Option<ItemStatus>,
    ) -> AppResult<Vec<ProductItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|i| i.product_id == product_id)
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect())
    }

    async fn add_item(&self, product_id: i64, payload: &CreateProductItem) -> AppResult<ProductItem> {
        let mut tables = self.tables.write().await;
        if tables
            .items
            .values()
            .any(|i| i.serial_number == payload.serial_number)
        {
            return Err(AppError::BadRequest(format!(
                "serial number {} already exists",
                payload.serial_number
            )));
        }
        let item = ProductItem {
            id: next_id(&tables.items),
            product_id,
            serial_number: payload.serial_number.clone(),
            status: payload.status.unwrap_or(ItemStatus::Available),
            updated_at: Utc::now(),
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn set_item_status(
        &self,
        serial_number: &str,
        status: ItemStatus,
    ) -> AppResult<ProductItem> {
        let mut tables = self.tables.write().await;
        let item = tables
            .items
            .values_mut()
            .find(|i| i.serial_number == serial_number)
            .ok_or_else(|| AppError::ItemNotFound(serial_number.to_string()))?;
        item.status = status;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn claim_available_item(&self, product_id: i64) -> AppResult<Option<ProductItem>> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .items
            .values_mut()
            .find(|i| i.product_id == product_id && i.status == ItemStatus::Available)
        else {
            return Ok(None);
        };
        item.status = ItemStatus::Replaced;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn add_transaction(&self, new: NewTransaction) -> AppResult<Transaction> {
        let mut tables = self.tables.write().await;
        let transaction = Transaction {
            id: next_id(&tables.transactions),
            request_id: new.request_id,
            transaction_type: new.transaction_type,
            transaction_id: new.transaction_id,
            payment_date: new.payment_date,
            amount_cents: new.amount_cents,
        };
        tables.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn transactions_for_request(&self, request_id: i64) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .values()
            .filter(|t| t.request_id == request_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn add_product(&self, payload: &CreateProduct) -> AppResult<Product> {
        let mut tables = self.tables.write().await;
        let product = Product {
            id: next_id(&tables.products),
            name: payload.name.clone(),
            description: payload.description.clone(),
            price_cents: payload.price_cents,
            category: payload.category.clone(),
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i64, payload: &UpdateProduct) -> AppResult<Product> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;
        if let Some(name) = &payload.name {
            product.name = name.clone();
        }
        if payload.description.is_some() {
            product.description = payload.description.clone();
        }
        if let Some(price_cents) = payload.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(category) = &payload.category {
            product.category = category.clone();
        }
        Ok(product.clone())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(user_id: i64) -> NewReturnRequest {
        NewReturnRequest {
            user_id,
            order_id: 100,
            product_id: 55,
            return_policy: "30-day".to_string(),
            reason: "Missing parts".to_string(),
            request_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let store = InMemoryStore::new();
        let request = store.add_request(new_request(7)).await.unwrap();
        assert_eq!(request.version, 1);

        let updated = store.update_request(&request).await.unwrap();
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = InMemoryStore::new();
        let request = store.add_request(new_request(7)).await.unwrap();
        store.update_request(&request).await.unwrap();

        let err = store.update_request(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(id) if id == request.id));
    }

    #[tokio::test]
    async fn update_unknown_request_is_not_found() {
        let store = InMemoryStore::new();
        let mut request = store.add_request(new_request(7)).await.unwrap();
        request.id = 999;
        let err = store.update_request(&request).await.unwrap_err();
        assert!(matches!(err, AppError::RequestNotFound(999)));
    }

    #[tokio::test]
    async fn finds_are_ordered_by_id() {
        let store = InMemoryStore::new();
        for serial in ["SN-3", "SN-1", "SN-2"] {
            store
                .add_item(
                    55,
                    &CreateProductItem {
                        serial_number: serial.to_string(),
                        status: None,
                    },
                )
                .await
                .unwrap();
        }
        let items = store.find_items(55, Some(ItemStatus::Available)).await.unwrap();
        let serials: Vec<&str> = items.iter().map(|i| i.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["SN-3", "SN-1", "SN-2"]);
        assert!(items.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn unknown_serial_is_item_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .set_item_status("nope", ItemStatus::Disposed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn claim_takes_lowest_available_unit() {
        let store = InMemoryStore::new();
        for (serial, status) in [
            ("SN-1", ItemStatus::Sold),
            ("SN-2", ItemStatus::Available),
            ("SN-3", ItemStatus::Available),
        ] {
            store
                .add_item(
                    55,
                    &CreateProductItem {
                        serial_number: serial.to_string(),
                        status: Some(status),
                    },
                )
                .await
                .unwrap();
        }

        let first = store.claim_available_item(55).await.unwrap().unwrap();
        assert_eq!(first.serial_number, "SN-2");
        assert_eq!(first.status, ItemStatus::Replaced);
        let second = store.claim_available_item(55).await.unwrap().unwrap();
        assert_eq!(second.serial_number, "SN-3");
        assert!(store.claim_available_item(55).await.unwrap().is_none());
        assert!(store.claim_available_item(56).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_serial_is_rejected() {
        let store = InMemoryStore::new();
        let payload = CreateProductItem {
            serial_number: "SN-1".to_string(),
            status: None,
        };
        store.add_item(55, &payload).await.unwrap();
        let err = store.add_item(56, &payload).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn added_orders_get_distinct_line_ids() {
        let store = InMemoryStore::new();
        let lines = vec![
            NewOrderLine {
                product_id: 1,
                serial_number: "A".to_string(),
                price_cents: 100,
            },
            NewOrderLine {
                product_id: 2,
                serial_number: "B".to_string(),
                price_cents: 200,
            },
        ];
        let order = store
            .add_order(NewOrder {
                user_id: 7,
                status: OrderStatus::Delivered,
                order_date: Utc::now(),
                lines,
            })
            .await
            .unwrap();
        assert_eq!(order.order_products.len(), 2);
        assert_ne!(order.order_products[0].id, order.order_products[1].id);
        assert_eq!(store.get_order(order.id).await.unwrap(), Some(order));
    }
}

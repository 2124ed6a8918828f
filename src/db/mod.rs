//! Persistence abstraction for the return workflow.
//!
//! One trait per entity family. Single-entity lookups return `Option`,
//! plural finds return a possibly empty `Vec` ordered by ascending id, so
//! "first match" always means lowest id regardless of backend.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::*;

#[async_trait]
pub trait ReturnRequestStore: Send + Sync {
    async fn get_request(&self, id: i64) -> AppResult<Option<ReturnRequest>>;

    async fn add_request(&self, new: NewReturnRequest) -> AppResult<ReturnRequest>;

    /// Persist `request` if its `version` still matches the stored row.
    ///
    /// Returns the stored request with the bumped version. Fails with
    /// `RequestNotFound` for an unknown id and `Conflict` on a stale version.
    async fn update_request(&self, request: &ReturnRequest) -> AppResult<ReturnRequest>;

    async fn find_requests(&self, filter: &ReturnRequestFilter) -> AppResult<Vec<ReturnRequest>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Order with its lines populated.
    async fn get_order(&self, id: i64) -> AppResult<Option<Order>>;

    async fn add_order(&self, new: NewOrder) -> AppResult<Order>;

    async fn update_order_product(&self, line: &OrderProduct) -> AppResult<OrderProduct>;
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Policies for a product, optionally narrowed to one policy type.
    async fn find_policies(
        &self,
        product_id: i64,
        policy_type: Option<&str>,
    ) -> AppResult<Vec<Policy>>;

    async fn add_policy(&self, product_id: i64, payload: &CreatePolicy) -> AppResult<Policy>;
}

#[async_trait]
pub trait ProductItemStore: Send + Sync {
    async fn get_item(&self, serial_number: &str) -> AppResult<Option<ProductItem>>;

    async fn find_items(
        &self,
        product_id: i64,
        status: Option<ItemStatus>,
    ) -> AppResult<Vec<ProductItem>>;

    async fn add_item(&self, product_id: i64, payload: &CreateProductItem) -> AppResult<ProductItem>;

    /// Fails with `ItemNotFound` when the serial number is unknown.
    async fn set_item_status(&self, serial_number: &str, status: ItemStatus)
        -> AppResult<ProductItem>;

    /// Mark the lowest-id `Available` unit of a product `Replaced` and return it.
    ///
    /// The find and the write are one atomic step, so two callers never claim
    /// the same unit. `None` when the product has no available unit.
    async fn claim_available_item(&self, product_id: i64) -> AppResult<Option<ProductItem>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn add_transaction(&self, new: NewTransaction) -> AppResult<Transaction>;

    async fn transactions_for_request(&self, request_id: i64) -> AppResult<Vec<Transaction>>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>>;

    async fn add_product(&self, payload: &CreateProduct) -> AppResult<Product>;

    /// Merge the present fields into the stored product. Fails with
    /// `NotFound` for an unknown id.
    async fn update_product(&self, id: i64, payload: &UpdateProduct) -> AppResult<Product>;

    async fn list_products(&self) -> AppResult<Vec<Product>>;
}

/// Everything the service needs from a single backend.
pub trait Store:
    ReturnRequestStore + OrderStore + PolicyStore + ProductItemStore + TransactionStore + ProductStore
{
}

impl<T> Store for T where
    T: ReturnRequestStore
        + OrderStore
        + PolicyStore
        + ProductItemStore
        + TransactionStore
        + ProductStore
{
}

use std::sync::Arc;

use tracing::info;

use crate::db::{PolicyStore, ProductStore, Store};
use crate::error::{AppError, AppResult};
use crate::models::*;

use super::InventoryCoordinator;

/// Reference data the return workflow reads: products, their units and policies.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    policies: Arc<dyn PolicyStore>,
    inventory: InventoryCoordinator,
}

impl CatalogService {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        Self {
            products: store.clone(),
            policies: store.clone(),
            inventory: InventoryCoordinator::new(store),
        }
    }

    pub async fn add_product(&self, payload: &CreateProduct) -> AppResult<Product> {
        if payload.name.trim().is_empty() {
            return Err(AppError::BadRequest("name must not be empty".to_string()));
        }
        if payload.price_cents < 0 {
            return Err(AppError::BadRequest("price_cents must be >= 0".to_string()));
        }
        let product = self.products.add_product(payload).await?;
        info!(id = product.id, name = %product.name, "Created product");
        Ok(product)
    }

    pub async fn update_product(&self, id: i64, payload: &UpdateProduct) -> AppResult<Product> {
        if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(AppError::BadRequest("name must not be empty".to_string()));
        }
        if payload.price_cents.is_some_and(|price| price < 0) {
            return Err(AppError::BadRequest("price_cents must be >= 0".to_string()));
        }
        let product = self.products.update_product(id, payload).await?;
        info!(id, "Updated product");
        Ok(product)
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        self.products.list_products().await
    }

    pub async fn add_item(
        &self,
        product_id: i64,
        payload: &CreateProductItem,
    ) -> AppResult<ProductItem> {
        self.require_product(product_id).await?;
        let item = self.inventory.add_item(product_id, payload).await?;
        info!(product_id, serial_number = %item.serial_number, "Added product item");
        Ok(item)
    }

    pub async fn list_items(&self, product_id: i64) -> AppResult<Vec<ProductItem>> {
        self.require_product(product_id).await?;
        self.inventory.items_for_product(product_id).await
    }

    pub async fn update_item_status(
        &self,
        serial_number: &str,
        status: ItemStatus,
    ) -> AppResult<ProductItem> {
        self.inventory.set_item_status(serial_number, status).await
    }

    pub async fn add_policy(&self, product_id: i64, payload: &CreatePolicy) -> AppResult<Policy> {
        if payload.policy_type.trim().is_empty() {
            return Err(AppError::BadRequest("policy_type must not be empty".to_string()));
        }
        if payload.duration_days < 0 {
            return Err(AppError::BadRequest("duration_days must be >= 0".to_string()));
        }
        self.require_product(product_id).await?;
        let policy = self.policies.add_policy(product_id, payload).await?;
        info!(product_id, policy_type = %policy.policy_type, "Added return policy");
        Ok(policy)
    }

    pub async fn list_policies(&self, product_id: i64) -> AppResult<Vec<Policy>> {
        self.require_product(product_id).await?;
        self.policies.find_policies(product_id, None).await
    }

    async fn require_product(&self, product_id: i64) -> AppResult<Product> {
        self.products
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))
    }
}

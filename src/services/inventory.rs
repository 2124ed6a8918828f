use std::sync::Arc;

use tracing::debug;

use crate::db::ProductItemStore;
use crate::error::{AppError, AppResult};
use crate::models::{CreateProductItem, ItemStatus, ProductItem};

/// Owns the status of serial-numbered units. Callers request transitions,
/// they never write item rows themselves.
#[derive(Clone)]
pub struct InventoryCoordinator {
    items: Arc<dyn ProductItemStore>,
}

impl InventoryCoordinator {
    pub fn new(items: Arc<dyn ProductItemStore>) -> Self {
        Self { items }
    }

    /// Idempotent status write. Unknown serial numbers fail with `ItemNotFound`,
    /// any other store failure surfaces as a dependency failure.
    pub async fn set_item_status(
        &self,
        serial_number: &str,
        status: ItemStatus,
    ) -> AppResult<ProductItem> {
        let item = self
            .items
            .set_item_status(serial_number, status)
            .await
            .map_err(|e| AppError::dependency("inventory update", e))?;
        debug!(serial_number, status = %status, "Updated product item status");
        Ok(item)
    }

    /// Claim the lowest-id `Available` unit of the product as a replacement.
    /// The unit comes back already marked `Replaced`.
    pub async fn claim_replacement(&self, product_id: i64) -> AppResult<ProductItem> {
        let item = self
            .items
            .claim_available_item(product_id)
            .await
            .map_err(|e| AppError::dependency("replacement claim", e))?
            .ok_or(AppError::OutOfStock(product_id))?;
        debug!(product_id, serial_number = %item.serial_number, "Claimed replacement unit");
        Ok(item)
    }

    pub async fn add_item(
        &self,
        product_id: i64,
        payload: &CreateProductItem,
    ) -> AppResult<ProductItem> {
        if payload.serial_number.trim().is_empty() {
            return Err(AppError::BadRequest(
                "serial_number must not be empty".to_string(),
            ));
        }
        self.items.add_item(product_id, payload).await
    }

    pub async fn items_for_product(&self, product_id: i64) -> AppResult<Vec<ProductItem>> {
        self.items.find_items(product_id, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    async fn coordinator_with(units: &[(&str, ItemStatus)]) -> InventoryCoordinator {
        let store = Arc::new(InMemoryStore::new());
        for (serial, status) in units {
            store
                .add_item(
                    55,
                    &CreateProductItem {
                        serial_number: serial.to_string(),
                        status: Some(*status),
                    },
                )
                .await
                .unwrap();
        }
        InventoryCoordinator::new(store)
    }

    #[tokio::test]
    async fn set_status_is_idempotent() {
        let inventory = coordinator_with(&[("SN-1", ItemStatus::Sold)]).await;
        inventory.set_item_status("SN-1", ItemStatus::Disposed).await.unwrap();
        let item = inventory.set_item_status("SN-1", ItemStatus::Disposed).await.unwrap();
        assert_eq!(item.status, ItemStatus::Disposed);
    }

    #[tokio::test]
    async fn set_status_unknown_serial() {
        let inventory = coordinator_with(&[]).await;
        let err = inventory
            .set_item_status("SN-404", ItemStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ItemNotFound(s) if s == "SN-404"));
    }

    #[tokio::test]
    async fn replacement_skips_unavailable_units() {
        let inventory = coordinator_with(&[
            ("SN-1", ItemStatus::Sold),
            ("SN-2", ItemStatus::Available),
            ("SN-3", ItemStatus::Available),
        ])
        .await;
        let item = inventory.claim_replacement(55).await.unwrap();
        assert_eq!(item.serial_number, "SN-2");
        assert_eq!(item.status, ItemStatus::Replaced);
    }

    #[tokio::test]
    async fn claimed_unit_is_not_handed_out_twice() {
        let inventory = coordinator_with(&[
            ("SN-2", ItemStatus::Available),
            ("SN-3", ItemStatus::Available),
        ])
        .await;

        let (first, second) = tokio::join!(
            inventory.claim_replacement(55),
            inventory.claim_replacement(55)
        );
        let mut serials = vec![first.unwrap().serial_number, second.unwrap().serial_number];
        serials.sort();
        assert_eq!(serials, vec!["SN-2", "SN-3"]);

        let err = inventory.claim_replacement(55).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(55)));
    }

    #[tokio::test]
    async fn replacement_out_of_stock() {
        let inventory = coordinator_with(&[("SN-1", ItemStatus::Sold)]).await;
        let err = inventory.claim_replacement(55).await.unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(55)));
        let items = inventory.items_for_product(55).await.unwrap();
        assert_eq!(items[0].status, ItemStatus::Sold);
    }

    #[tokio::test]
    async fn blank_serial_rejected() {
        let inventory = coordinator_with(&[]).await;
        let payload = CreateProductItem {
            serial_number: "  ".to_string(),
            status: None,
        };
        assert!(matches!(
            inventory.add_item(55, &payload).await,
            Err(AppError::BadRequest(_))
        ));
    }
}

use std::sync::Arc;

use crate::db::OrderStore;
use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderProduct, OrderStatus};

/// A delivered order together with the line under review.
#[derive(Debug, Clone)]
pub struct DeliveredLine {
    pub order: Order,
    pub line: OrderProduct,
}

#[derive(Clone)]
pub struct OrderLookup {
    orders: Arc<dyn OrderStore>,
}

impl OrderLookup {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Resolve the line for `product_id` on a delivered order owned by `user_id`.
    ///
    /// Missing orders, orders of another user and undelivered orders all fail
    /// as `InvalidOrder`.
    pub async fn resolve_delivered_order_line(
        &self,
        order_id: i64,
        user_id: i64,
        product_id: i64,
    ) -> AppResult<DeliveredLine> {
        let order = self
            .orders
            .get_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id && o.status == OrderStatus::Delivered)
            .ok_or(AppError::InvalidOrder(order_id))?;

        let line = order
            .line_for_product(product_id)
            .cloned()
            .ok_or(AppError::LineItemNotFound {
                order_id,
                product_id,
            })?;

        Ok(DeliveredLine { order, line })
    }
}

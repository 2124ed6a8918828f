use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseEnumError::new("order status", other)),
        }
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub order_products: Vec<OrderProduct>,
}

impl Order {
    /// First line (lowest id) for the given product.
    pub fn line_for_product(&self, product_id: i64) -> Option<&OrderProduct> {
        self.order_products
            .iter()
            .filter(|line| line.product_id == product_id)
            .min_by_key(|line| line.id)
    }

    pub fn line_for_serial(&self, serial_number: &str) -> Option<&OrderProduct> {
        self.order_products
            .iter()
            .find(|line| line.serial_number == serial_number)
    }
}

/// Line item binding one serial-numbered unit to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub serial_number: String,
    pub price_cents: i64,
}

/// Order about to be inserted together with its lines.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub serial_number: String,
    pub price_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i64, product_id: i64, serial: &str) -> OrderProduct {
        OrderProduct {
            id,
            order_id: 100,
            product_id,
            serial_number: serial.to_string(),
            price_cents: 2500,
        }
    }

    #[test]
    fn line_for_product_picks_lowest_id() {
        let order = Order {
            id: 100,
            user_id: 7,
            status: OrderStatus::Delivered,
            order_date: Utc::now(),
            order_products: vec![line(9, 55, "SN-B"), line(3, 55, "SN-A"), line(4, 56, "SN-C")],
        };
        assert_eq!(order.line_for_product(55).map(|l| l.id), Some(3));
        assert!(order.line_for_product(57).is_none());
        assert_eq!(order.line_for_serial("SN-C").map(|l| l.product_id), Some(56));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Catalog entry. Physical units are tracked separately as [`ProductItem`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Price stored as integer cents (e.g. 999 = $9.99)
    pub price_cents: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    Available,
    Sold,
    Replaced,
    Disposed,
    Repaired,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "Available",
            ItemStatus::Sold => "Sold",
            ItemStatus::Replaced => "Replaced",
            ItemStatus::Disposed => "Disposed",
            ItemStatus::Repaired => "Repaired",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(ItemStatus::Available),
            "Sold" => Ok(ItemStatus::Sold),
            "Replaced" => Ok(ItemStatus::Replaced),
            "Disposed" => Ok(ItemStatus::Disposed),
            "Repaired" => Ok(ItemStatus::Repaired),
            other => Err(ParseEnumError::new("item status", other)),
        }
    }
}

/// A single serial-numbered physical unit of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: i64,
    pub product_id: i64,
    pub serial_number: String,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    /// Price in cents
    pub price_cents: i64,
    pub category: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductItem {
    pub serial_number: String,
    /// Defaults to `Available`.
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateItemStatus {
    pub status: ItemStatus,
}

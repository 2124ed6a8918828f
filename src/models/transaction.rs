use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Refund => "Refund",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Refund" => Ok(TransactionType::Refund),
            other => Err(ParseEnumError::new("transaction type", other)),
        }
    }
}

/// Payment record tied to a return request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub request_id: i64,
    pub transaction_type: TransactionType,
    pub transaction_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub amount_cents: i64,
}

/// Descriptor handed to the payment service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub request_id: i64,
    pub transaction_type: TransactionType,
    pub transaction_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub amount_cents: i64,
}

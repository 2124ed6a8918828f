use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Order, ParseEnumError, Product, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Processing,
    Closed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Processing => "Processing",
            RequestStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Processing" => Ok(RequestStatus::Processing),
            "Closed" => Ok(RequestStatus::Closed),
            other => Err(ParseEnumError::new("request status", other)),
        }
    }
}

/// Outcome chosen by the technical review of a returned unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessOutcome {
    #[serde(rename = "Return Good")]
    ReturnGood,
    #[serde(rename = "Return Bad")]
    ReturnBad,
    #[serde(rename = "Replace Repaired")]
    ReplaceRepaired,
    #[serde(rename = "Replace Bad")]
    ReplaceBad,
    Repaired,
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessOutcome::ReturnGood => "Return Good",
            ProcessOutcome::ReturnBad => "Return Bad",
            ProcessOutcome::ReplaceRepaired => "Replace Repaired",
            ProcessOutcome::ReplaceBad => "Replace Bad",
            ProcessOutcome::Repaired => "Repaired",
        }
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessOutcome {
    type Err = ParseEnumError;

    /// Accepts the spaced wire names ("Return Good") and their unspaced forms ("ReturnGood").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Return Good" | "ReturnGood" => Ok(ProcessOutcome::ReturnGood),
            "Return Bad" | "ReturnBad" => Ok(ProcessOutcome::ReturnBad),
            "Replace Repaired" | "ReplaceRepaired" => Ok(ProcessOutcome::ReplaceRepaired),
            "Replace Bad" | "ReplaceBad" => Ok(ProcessOutcome::ReplaceBad),
            "Repaired" => Ok(ProcessOutcome::Repaired),
            other => Err(ParseEnumError::new("process", other)),
        }
    }
}

/// A user's claim to return or exchange a delivered unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub serial_number: Option<String>,
    pub return_policy: String,
    pub reason: String,
    pub feedback: Option<String>,
    pub status: RequestStatus,
    pub process: Option<ProcessOutcome>,
    pub request_date: DateTime<Utc>,
    pub closed_date: Option<DateTime<Utc>>,
    pub closed_by: Option<i64>,
    /// Set while a technical review is applying its side effects. Other
    /// writers back off with a conflict until the review records its outcome.
    pub in_review: bool,
    /// Optimistic concurrency token, bumped on every successful write.
    pub version: i64,
}

impl ReturnRequest {
    pub fn is_closed(&self) -> bool {
        self.status == RequestStatus::Closed
    }
}

/// Fields of a request about to be inserted; the store assigns id and version.
#[derive(Debug, Clone)]
pub struct NewReturnRequest {
    pub user_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub return_policy: String,
    pub reason: String,
    pub request_date: DateTime<Utc>,
}

/// Filter for plural request queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ReturnRequestFilter {
    pub request_id: Option<i64>,
    pub user_id: Option<i64>,
    pub exclude_closed: bool,
}

impl ReturnRequestFilter {
    pub fn matches(&self, request: &ReturnRequest) -> bool {
        self.request_id.map_or(true, |id| request.id == id)
            && self.user_id.map_or(true, |id| request.user_id == id)
            && !(self.exclude_closed && request.is_closed())
    }
}

/// Request joined with its transactions, product and order for richer API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnRequestDetails {
    #[serde(flatten)]
    pub request: ReturnRequest,
    pub transactions: Vec<Transaction>,
    pub product: Option<Product>,
    pub order: Option<Order>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct OpenReturnRequest {
    pub user_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub return_policy: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSerialNumber {
    pub serial_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechnicalReview {
    /// Kept as free text so unknown outcomes reach the engine and fail as `InvalidProcess`.
    pub process: String,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseReturnRequest {
    pub closed_by: i64,
    pub feedback: Option<String>,
}

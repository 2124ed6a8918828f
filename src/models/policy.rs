use serde::{Deserialize, Serialize};

/// Return rule for a product: a policy type valid for `duration_days` after the order date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: i64,
    pub product_id: i64,
    pub policy_type: String,
    pub duration_days: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicy {
    pub policy_type: String,
    pub duration_days: i32,
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::PolicyStore;
use crate::error::{AppError, AppResult};
use crate::models::Policy;

/// Whole days elapsed between the order and `now`.
pub fn elapsed_days(order_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - order_date).num_days()
}

/// Decides whether a product may still be returned under a policy type.
#[derive(Clone)]
pub struct PolicyEvaluator {
    policies: Arc<dyn PolicyStore>,
}

impl PolicyEvaluator {
    pub fn new(policies: Arc<dyn PolicyStore>) -> Self {
        Self { policies }
    }

    /// Returns the matching policy when the return is still eligible.
    ///
    /// When several policies share the (product, policy type) pair the one
    /// with the lowest id wins. Eligibility ends once more than
    /// `duration_days` whole days have passed since the order date.
    pub async fn evaluate(
        &self,
        product_id: i64,
        policy_type: &str,
        order_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Policy> {
        let policy = self
            .policies
            .find_policies(product_id, Some(policy_type))
            .await?
            .into_iter()
            .min_by_key(|p| p.id)
            .ok_or_else(|| AppError::PolicyNotApplicable {
                product_id,
                policy_type: policy_type.to_string(),
            })?;

        let elapsed = elapsed_days(order_date, now);
        if elapsed > i64::from(policy.duration_days) {
            return Err(AppError::PolicyExpired {
                duration_days: policy.duration_days,
                elapsed_days: elapsed,
            });
        }

        Ok(policy)
    }
}

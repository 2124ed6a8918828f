use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::TransactionStore;
use crate::error::{AppError, AppResult};
use crate::models::{NewTransaction, Transaction, TransactionType};

/// Records payments. Success means the transaction is durably stored.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn process_payment(&self, transaction: NewTransaction) -> AppResult<Transaction>;
}

/// Payment service that writes straight to the transaction ledger.
pub struct LedgerPaymentService {
    transactions: Arc<dyn TransactionStore>,
}

impl LedgerPaymentService {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl PaymentService for LedgerPaymentService {
    async fn process_payment(&self, transaction: NewTransaction) -> AppResult<Transaction> {
        if transaction.amount_cents < 0 {
            return Err(AppError::BadRequest(
                "payment amount must be >= 0".to_string(),
            ));
        }
        self.transactions.add_transaction(transaction).await
    }
}

#[derive(Clone)]
pub struct PaymentCoordinator {
    payments: Arc<dyn PaymentService>,
}

impl PaymentCoordinator {
    pub fn new(payments: Arc<dyn PaymentService>) -> Self {
        Self { payments }
    }

    /// Issue a refund for a return request under a fresh transaction id.
    pub async fn issue_refund(&self, request_id: i64, amount_cents: i64) -> AppResult<Transaction> {
        let transaction = NewTransaction {
            request_id,
            transaction_type: TransactionType::Refund,
            transaction_id: Uuid::new_v4(),
            payment_date: Utc::now(),
            amount_cents,
        };

        let recorded = self
            .payments
            .process_payment(transaction)
            .await
            .map_err(|e| AppError::dependency("refund", e))?;

        info!(
            request_id,
            transaction_id = %recorded.transaction_id,
            amount_cents,
            "Issued refund"
        );
        Ok(recorded)
    }
}

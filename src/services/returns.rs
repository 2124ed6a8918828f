//! Return request workflow.
//!
//! Requests move `Pending -> Processing -> Closed`. The technical review
//! outcome (`process`) is orthogonal to the status and may be recorded any
//! number of times until the request is closed. Every write goes through the
//! store's optimistic version check, so two concurrent calls on the same
//! request cannot both commit. A running review also holds the request's
//! `in_review` flag until its outcome is recorded.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::{OrderStore, ProductStore, ReturnRequestStore, Store, TransactionStore};
use crate::error::{AppError, AppResult};
use crate::models::*;

use super::{
    InventoryCoordinator, LedgerPaymentService, OrderLookup, PaymentCoordinator, PaymentService,
    PolicyEvaluator,
};

#[derive(Clone)]
pub struct ReturnRequestService {
    requests: Arc<dyn ReturnRequestStore>,
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    transactions: Arc<dyn TransactionStore>,
    order_lookup: OrderLookup,
    policies: PolicyEvaluator,
    inventory: InventoryCoordinator,
    payments: PaymentCoordinator,
}

impl ReturnRequestService {
    pub fn new<S>(store: Arc<S>, payments: Arc<dyn PaymentService>) -> Self
    where
        S: Store + 'static,
    {
        Self {
            requests: store.clone(),
            orders: store.clone(),
            products: store.clone(),
            transactions: store.clone(),
            order_lookup: OrderLookup::new(store.clone()),
            policies: PolicyEvaluator::new(store.clone()),
            inventory: InventoryCoordinator::new(store),
            payments: PaymentCoordinator::new(payments),
        }
    }

    /// Service whose refunds are written to the store's own transaction ledger.
    pub fn with_ledger<S>(store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        let payments = Arc::new(LedgerPaymentService::new(store.clone()));
        Self::new(store, payments)
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    pub async fn open_return_request(&self, payload: &OpenReturnRequest) -> AppResult<ReturnRequest> {
        let delivered = self
            .order_lookup
            .resolve_delivered_order_line(payload.order_id, payload.user_id, payload.product_id)
            .await
            .inspect_err(|e| warn!(order_id = payload.order_id, error = %e, "Rejected return request"))?;

        let now = Utc::now();
        self.policies
            .evaluate(
                payload.product_id,
                &payload.return_policy,
                delivered.order.order_date,
                now,
            )
            .await
            .inspect_err(|e| warn!(order_id = payload.order_id, error = %e, "Rejected return request"))?;

        let request = self
            .requests
            .add_request(NewReturnRequest {
                user_id: payload.user_id,
                order_id: payload.order_id,
                product_id: payload.product_id,
                return_policy: payload.return_policy.clone(),
                reason: payload.reason.clone(),
                request_date: now,
            })
            .await?;

        info!(
            request_id = request.id,
            user_id = request.user_id,
            order_id = request.order_id,
            product_id = request.product_id,
            line_id = delivered.line.id,
            "Opened return request"
        );
        Ok(request)
    }

    /// Bind the disputed unit to the request and move it to `Processing`.
    pub async fn update_user_serial_number(
        &self,
        request_id: i64,
        serial_number: &str,
    ) -> AppResult<ReturnRequest> {
        let mut request = self.load_open(request_id).await?;

        let order = self
            .orders
            .get_order(request.order_id)
            .await?
            .ok_or(AppError::InvalidOrder(request.order_id))?;
        if order.line_for_serial(serial_number).is_none() {
            return Err(AppError::InvalidSerialNumber(serial_number.to_string()));
        }

        request.serial_number = Some(serial_number.to_string());
        request.status = RequestStatus::Processing;
        let saved = self.requests.update_request(&request).await?;

        info!(request_id, serial_number, "Assigned serial number to return request");
        Ok(saved)
    }

    /// Apply a technical review outcome and record it on the request.
    ///
    /// One versioned write sets `in_review` before any side effect. While it
    /// is set, reviews, closes and serial updates of the request fail with
    /// `RequestInReview`. `process` and `feedback` are written in the same
    /// update that clears the flag, after every side effect has succeeded. A
    /// failed side effect clears the flag and leaves the outcome unrecorded.
    pub async fn technical_review(
        &self,
        request_id: i64,
        payload: &TechnicalReview,
    ) -> AppResult<ReturnRequest> {
        let mut request = self.load_open(request_id).await?;
        let outcome: ProcessOutcome = payload
            .process
            .parse()
            .map_err(|_| AppError::InvalidProcess(payload.process.clone()))?;
        let serial_number = request
            .serial_number
            .clone()
            .ok_or(AppError::SerialNumberMissing(request_id))?;

        request.in_review = true;
        let mut claimed = self.requests.update_request(&request).await?;

        if let Err(e) = self.apply_outcome(&claimed, outcome, &serial_number).await {
            claimed.in_review = false;
            if let Err(release) = self.requests.update_request(&claimed).await {
                warn!(request_id, error = %release, "Failed to release review claim");
            }
            return Err(e);
        }

        claimed.process = Some(outcome);
        claimed.feedback = payload.feedback.clone();
        claimed.in_review = false;
        let saved = self
            .requests
            .update_request(&claimed)
            .await
            .inspect_err(|e| {
                warn!(request_id, process = %outcome, error = %e, "Review side effects applied but outcome not recorded")
            })?;

        info!(request_id, process = %outcome, "Recorded technical review");
        Ok(saved)
    }

    /// Close a request. Already closed requests are closed again, overwriting
    /// the closer, date and feedback.
    pub async fn close_return_request(
        &self,
        closed_by: i64,
        request_id: i64,
        feedback: Option<String>,
    ) -> AppResult<ReturnRequest> {
        let mut request = self.load_for_update(request_id).await?;

        request.feedback = feedback;
        request.status = RequestStatus::Closed;
        request.closed_date = Some(Utc::now());
        request.closed_by = Some(closed_by);
        let saved = self.requests.update_request(&request).await?;

        info!(request_id, closed_by, "Closed return request");
        Ok(saved)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Every request that is not closed.
    pub async fn get_all_return_requests(&self) -> AppResult<Vec<ReturnRequestDetails>> {
        let filter = ReturnRequestFilter {
            exclude_closed: true,
            ..Default::default()
        };
        self.find_details(&filter).await
    }

    /// Every request of a user, closed ones included.
    pub async fn get_all_user_return_requests(
        &self,
        user_id: i64,
    ) -> AppResult<Vec<ReturnRequestDetails>> {
        let filter = ReturnRequestFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.find_details(&filter).await
    }

    pub async fn get_return_request(&self, request_id: i64) -> AppResult<ReturnRequestDetails> {
        let filter = ReturnRequestFilter {
            request_id: Some(request_id),
            ..Default::default()
        };
        self.find_details(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::RequestNotFound(request_id))
    }

    // ── Outcome handlers ─────────────────────────────────────────────────────

    async fn apply_outcome(
        &self,
        request: &ReturnRequest,
        outcome: ProcessOutcome,
        serial_number: &str,
    ) -> AppResult<()> {
        match outcome {
            ProcessOutcome::ReturnGood => {
                self.refund_and_restock(request, serial_number, ItemStatus::Available)
                    .await
            }
            ProcessOutcome::ReturnBad => {
                self.refund_and_restock(request, serial_number, ItemStatus::Disposed)
                    .await
            }
            // Both replacement outcomes end with the original unit disposed once.
            ProcessOutcome::ReplaceRepaired | ProcessOutcome::ReplaceBad => {
                self.replace_unit(request, serial_number).await
            }
            ProcessOutcome::Repaired => {
                self.inventory
                    .set_item_status(serial_number, ItemStatus::Repaired)
                    .await?;
                Ok(())
            }
        }
    }

    /// Refund first; the unit is only touched once the refund is recorded.
    async fn refund_and_restock(
        &self,
        request: &ReturnRequest,
        serial_number: &str,
        status: ItemStatus,
    ) -> AppResult<()> {
        let line = self.reviewed_line(request, serial_number).await?;
        self.payments
            .issue_refund(request.id, line.price_cents)
            .await?;
        self.inventory.set_item_status(serial_number, status).await?;
        Ok(())
    }

    /// Claim a replacement, rebind the order line to it, then dispose the original.
    async fn replace_unit(&self, request: &ReturnRequest, serial_number: &str) -> AppResult<()> {
        let mut line = self.reviewed_line(request, serial_number).await?;
        let replacement = self.inventory.claim_replacement(request.product_id).await?;

        line.serial_number = replacement.serial_number.clone();
        self.orders
            .update_order_product(&line)
            .await
            .map_err(|e| AppError::dependency("order line update", e))?;

        self.inventory
            .set_item_status(serial_number, ItemStatus::Disposed)
            .await?;

        info!(
            request_id = request.id,
            original = serial_number,
            replacement = %replacement.serial_number,
            "Replaced product item"
        );
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Load a request that is about to be written. A request held by a running
    /// technical review is refused.
    async fn load_for_update(&self, request_id: i64) -> AppResult<ReturnRequest> {
        let request = self
            .requests
            .get_request(request_id)
            .await?
            .ok_or(AppError::RequestNotFound(request_id))?;
        if request.in_review {
            return Err(AppError::RequestInReview(request_id));
        }
        Ok(request)
    }

    async fn load_open(&self, request_id: i64) -> AppResult<ReturnRequest> {
        let request = self.load_for_update(request_id).await?;
        if request.is_closed() {
            return Err(AppError::RequestClosed(request_id));
        }
        Ok(request)
    }

    /// The line of the request's order carrying the disputed unit.
    async fn reviewed_line(
        &self,
        request: &ReturnRequest,
        serial_number: &str,
    ) -> AppResult<OrderProduct> {
        let order = self
            .orders
            .get_order(request.order_id)
            .await?
            .ok_or(AppError::InvalidOrder(request.order_id))?;
        order
            .line_for_serial(serial_number)
            .cloned()
            .ok_or(AppError::LineItemNotFound {
                order_id: request.order_id,
                product_id: request.product_id,
            })
    }

    async fn find_details(&self, filter: &ReturnRequestFilter) -> AppResult<Vec<ReturnRequestDetails>> {
        let requests = self.requests.find_requests(filter).await?;
        let mut details = Vec::with_capacity(requests.len());
        for request in requests {
            let transactions = self.transactions.transactions_for_request(request.id).await?;
            let product = self.products.get_product(request.product_id).await?;
            let order = self.orders.get_order(request.order_id).await?;
            details.push(ReturnRequestDetails {
                request,
                transactions,
                product,
                order,
            });
        }
        Ok(details)
    }
}

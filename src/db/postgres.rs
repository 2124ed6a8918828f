use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    OrderStore, PolicyStore, ProductItemStore, ProductStore, ReturnRequestStore, TransactionStore,
};
use crate::error::{AppError, AppResult};
use crate::models::*;

/// Postgres-backed store. Status columns are stored as text.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// A duplicate serial number is the caller's mistake, anything else is ours.
fn item_insert_error(err: sqlx::Error, serial_number: &str) -> AppError {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            AppError::BadRequest(format!("serial number {} already exists", serial_number))
        }
        other => AppError::Database(other),
    }
}

fn decode<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr<Err = ParseEnumError>,
{
    value.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

// ── Rows ──────────────────────────────────────────────────────────────────────

const REQUEST_COLUMNS: &str = "id, user_id, order_id, product_id, serial_number, return_policy, \
     reason, feedback, status, process, request_date, closed_date, closed_by, in_review, version";

#[derive(sqlx::FromRow)]
struct ReturnRequestRow {
    id: i64,
    user_id: i64,
    order_id: i64,
    product_id: i64,
    serial_number: Option<String>,
    return_policy: String,
    reason: String,
    feedback: Option<String>,
    status: String,
    process: Option<String>,
    request_date: DateTime<Utc>,
    closed_date: Option<DateTime<Utc>>,
    closed_by: Option<i64>,
    in_review: bool,
    version: i64,
}

impl TryFrom<ReturnRequestRow> for ReturnRequest {
    type Error = sqlx::Error;

    fn try_from(row: ReturnRequestRow) -> Result<Self, Self::Error> {
        Ok(ReturnRequest {
            id: row.id,
            user_id: row.user_id,
            order_id: row.order_id,
            product_id: row.product_id,
            serial_number: row.serial_number,
            return_policy: row.return_policy,
            reason: row.reason,
            feedback: row.feedback,
            status: decode(&row.status)?,
            process: row.process.as_deref().map(decode).transpose()?,
            request_date: row.request_date,
            closed_date: row.closed_date,
            closed_by: row.closed_by,
            in_review: row.in_review,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    order_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderProductRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    serial_number: String,
    price_cents: i64,
}

impl From<OrderProductRow> for OrderProduct {
    fn from(row: OrderProductRow) -> Self {
        OrderProduct {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            serial_number: row.serial_number,
            price_cents: row.price_cents,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PolicyRow {
    id: i64,
    product_id: i64,
    policy_type: String,
    duration_days: i32,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: row.id,
            product_id: row.product_id,
            policy_type: row.policy_type,
            duration_days: row.duration_days,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductItemRow {
    id: i64,
    product_id: i64,
    serial_number: String,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductItemRow> for ProductItem {
    type Error = sqlx::Error;

    fn try_from(row: ProductItemRow) -> Result<Self, Self::Error> {
        Ok(ProductItem {
            id: row.id,
            product_id: row.product_id,
            serial_number: row.serial_number,
            status: decode(&row.status)?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    request_id: i64,
    transaction_type: String,
    transaction_id: Uuid,
    payment_date: DateTime<Utc>,
    amount_cents: i64,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = sqlx::Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            request_id: row.request_id,
            transaction_type: decode(&row.transaction_type)?,
            transaction_id: row.transaction_id,
            payment_date: row.payment_date,
            amount_cents: row.amount_cents,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price_cents: i64,
    category: String,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

// ── Return requests ───────────────────────────────────────────────────────────

#[async_trait]
impl ReturnRequestStore for PgStore {
    async fn get_request(&self, id: i64) -> AppResult<Option<ReturnRequest>> {
        let row = sqlx::query_as::<_, ReturnRequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM return_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ReturnRequest::try_from).transpose()?)
    }

    async fn add_request(&self, new: NewReturnRequest) -> AppResult<ReturnRequest> {
        let row = sqlx::query_as::<_, ReturnRequestRow>(&format!(
            r#"
            INSERT INTO return_requests
                (user_id, order_id, product_id, return_policy, reason, status, request_date, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.order_id)
        .bind(new.product_id)
        .bind(&new.return_policy)
        .bind(&new.reason)
        .bind(RequestStatus::Pending.as_str())
        .bind(new.request_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_into()?)
    }

    async fn update_request(&self, request: &ReturnRequest) -> AppResult<ReturnRequest> {
        let row = sqlx::query_as::<_, ReturnRequestRow>(&format!(
            r#"
            UPDATE return_requests
            SET serial_number = $1,
                feedback      = $2,
                status        = $3,
                process       = $4,
                closed_date   = $5,
                closed_by     = $6,
                in_review     = $7,
                version       = version + 1
            WHERE id = $8 AND version = $9
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request.serial_number.as_deref())
        .bind(request.feedback.as_deref())
        .bind(request.status.as_str())
        .bind(request.process.map(|p| p.as_str()))
        .bind(request.closed_date)
        .bind(request.closed_by)
        .bind(request.in_review)
        .bind(request.id)
        .bind(request.version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.try_into()?);
        }
        // No row matched: either the id is unknown or the version moved on.
        match self.get_request(request.id).await? {
            Some(_) => Err(AppError::Conflict(request.id)),
            None => Err(AppError::RequestNotFound(request.id)),
        }
    }

    async fn find_requests(&self, filter: &ReturnRequestFilter) -> AppResult<Vec<ReturnRequest>> {
        let rows = sqlx::query_as::<_, ReturnRequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM return_requests
            WHERE ($1::bigint IS NULL OR id = $1)
              AND ($2::bigint IS NULL OR user_id = $2)
              AND (NOT $3 OR status <> 'Closed')
            ORDER BY id ASC
            "#
        ))
        .bind(filter.request_id)
        .bind(filter.user_id)
        .bind(filter.exclude_closed)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(ReturnRequest::try_from)
            .collect::<Result<_, _>>()?)
    }
}

// ── Orders ────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for PgStore {
    async fn get_order(&self, id: i64) -> AppResult<Option<Order>> {
        let Some(order) = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, status, order_date FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderProductRow>(
            "SELECT id, order_id, product_id, serial_number, price_cents
             FROM order_products WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Order {
            id: order.id,
            user_id: order.user_id,
            status: decode(&order.status)?,
            order_date: order.order_date,
            order_products: lines.into_iter().map(OrderProduct::from).collect(),
        }))
    }

    async fn add_order(&self, new: NewOrder) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (user_id, status, order_date) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.status.as_str())
        .bind(new.order_date)
        .fetch_one(&mut *tx)
        .await?;

        let mut order_products = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let row = sqlx::query_as::<_, OrderProductRow>(
                r#"
                INSERT INTO order_products (order_id, product_id, serial_number, price_cents)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, product_id, serial_number, price_cents
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.serial_number)
            .bind(line.price_cents)
            .fetch_one(&mut *tx)
            .await?;
            order_products.push(row.into());
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            user_id: new.user_id,
            status: new.status,
            order_date: new.order_date,
            order_products,
        })
    }

    async fn update_order_product(&self, line: &OrderProduct) -> AppResult<OrderProduct> {
        sqlx::query_as::<_, OrderProductRow>(
            r#"
            UPDATE order_products
            SET product_id = $1, serial_number = $2, price_cents = $3
            WHERE id = $4 AND order_id = $5
            RETURNING id, order_id, product_id, serial_number, price_cents
            "#,
        )
        .bind(line.product_id)
        .bind(&line.serial_number)
        .bind(line.price_cents)
        .bind(line.id)
        .bind(line.order_id)
        .fetch_optional(&self.pool)
        .await?
        .map(OrderProduct::from)
        .ok_or(AppError::LineItemNotFound {
            order_id: line.order_id,
            product_id: line.product_id,
        })
    }
}

// ── Policies ──────────────────────────────────────────────────────────────────

#[async_trait]
impl PolicyStore for PgStore {
    async fn find_policies(
        &self,
        product_id: i64,
        policy_type: Option<&str>,
    ) -> AppResult<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"
            SELECT id, product_id, policy_type, duration_days
            FROM policies
            WHERE product_id = $1
              AND ($2::text IS NULL OR policy_type = $2)
            ORDER BY id ASC
            "#,
        )
        .bind(product_id)
        .bind(policy_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Policy::from).collect())
    }

    async fn add_policy(&self, product_id: i64, payload: &CreatePolicy) -> AppResult<Policy> {
        let row = sqlx::query_as::<_, PolicyRow>(
            r#"
            INSERT INTO policies (product_id, policy_type, duration_days)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, policy_type, duration_days
            "#,
        )
        .bind(product_id)
        .bind(&payload.policy_type)
        .bind(payload.duration_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}

// ── Product items ─────────────────────────────────────────────────────────────

#[async_trait]
impl ProductItemStore for PgStore {
    async fn get_item(&self, serial_number: &str) -> AppResult<Option<ProductItem>> {
        let row = sqlx::query_as::<_, ProductItemRow>(
            "SELECT id, product_id, serial_number, status, updated_at
             FROM product_items WHERE serial_number = $1",
        )
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductItem::try_from).transpose()?)
    }

    async fn find_items(
        &self,
        product_id: i64,
        status: Option<ItemStatus>,
    ) -> AppResult<Vec<ProductItem>> {
        let rows = sqlx::query_as::<_, ProductItemRow>(
            r#"
            SELECT id, product_id, serial_number, status, updated_at
            FROM product_items
            WHERE product_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY id ASC
            "#,
        )
        .bind(product_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(ProductItem::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn add_item(&self, product_id: i64, payload: &CreateProductItem) -> AppResult<ProductItem> {
        let row = sqlx::query_as::<_, ProductItemRow>(
            r#"
            INSERT INTO product_items (product_id, serial_number, status)
            VALUES ($1, $2, $3)
            RETURNING id, product_id, serial_number, status, updated_at
            "#,
        )
        .bind(product_id)
        .bind(&payload.serial_number)
        .bind(payload.status.unwrap_or(ItemStatus::Available).as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| item_insert_error(e, &payload.serial_number))?;

        Ok(row.try_into()?)
    }

    async fn set_item_status(
        &self,
        serial_number: &str,
        status: ItemStatus,
    ) -> AppResult<ProductItem> {
        let row = sqlx::query_as::<_, ProductItemRow>(
            r#"
            UPDATE product_items
            SET status = $1, updated_at = $2
            WHERE serial_number = $3
            RETURNING id, product_id, serial_number, status, updated_at
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ItemNotFound(serial_number.to_string()))?;

        Ok(row.try_into()?)
    }

    async fn claim_available_item(&self, product_id: i64) -> AppResult<Option<ProductItem>> {
        // SKIP LOCKED lets a concurrent claim move on to the next unit.
        let row = sqlx::query_as::<_, ProductItemRow>(
            r#"
            UPDATE product_items
            SET status = $1, updated_at = $2
            WHERE id = (
                SELECT id FROM product_items
                WHERE product_id = $3 AND status = $4
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, product_id, serial_number, status, updated_at
            "#,
        )
        .bind(ItemStatus::Replaced.as_str())
        .bind(Utc::now())
        .bind(product_id)
        .bind(ItemStatus::Available.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductItem::try_from).transpose()?)
    }
}

// ── Transactions ──────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionStore for PgStore {
    async fn add_transaction(&self, new: NewTransaction) -> AppResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions
                (request_id, transaction_type, transaction_id, payment_date, amount_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, request_id, transaction_type, transaction_id, payment_date, amount_cents
            "#,
        )
        .bind(new.request_id)
        .bind(new.transaction_type.as_str())
        .bind(new.transaction_id)
        .bind(new.payment_date)
        .bind(new.amount_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_into()?)
    }

    async fn transactions_for_request(&self, request_id: i64) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, request_id, transaction_type, transaction_id, payment_date, amount_cents
            FROM transactions
            WHERE request_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<_, _>>()?)
    }
}

// ── Products ──────────────────────────────────────────────────────────────────

#[async_trait]
impl ProductStore for PgStore {
    async fn get_product(&self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price_cents, category, created_at
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn add_product(&self, payload: &CreateProduct) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, description, price_cents, category)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price_cents, category, created_at
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price_cents)
        .bind(&payload.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_product(&self, id: i64, payload: &UpdateProduct) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name        = COALESCE($1, name),
                description = COALESCE($2, description),
                price_cents = COALESCE($3, price_cents),
                category    = COALESCE($4, category)
            WHERE id = $5
            RETURNING id, name, description, price_cents, category, created_at
            "#,
        )
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.price_cents)
        .bind(payload.category.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

        Ok(row.into())
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, price_cents, category, created_at
             FROM products ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind as DbErrorKind};

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, thiserror::Error)]
    #[error("duplicate key value violates unique constraint")]
    struct DuplicateKey;

    impl DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(UNIQUE_VIOLATION))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> DbErrorKind {
            DbErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_serial_is_bad_request() {
        let err = item_insert_error(sqlx::Error::Database(Box::new(DuplicateKey)), "SN-1");
        assert!(matches!(&err, AppError::BadRequest(msg) if msg.contains("SN-1")));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn other_insert_failures_stay_database_errors() {
        let err = item_insert_error(sqlx::Error::RowNotFound, "SN-1");
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
    }
}

pub mod catalog;
pub mod returns;
pub mod seed;

use axum::{http::StatusCode, Json};
use serde_json::json;

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "return-service" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::{InMemoryStore, PolicyStore, ProductItemStore};
    use crate::models::*;
    use crate::{build_router, AppState};

    async fn app_with_order(ordered_days_ago: i64) -> Router {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_product(Product {
                id: 55,
                name: "Smart Monitor".to_string(),
                description: None,
                price_cents: 15_000,
                category: "Electronics".to_string(),
                created_at: Utc::now(),
            })
            .await;
        store
            .insert_order(Order {
                id: 100,
                user_id: 7,
                status: OrderStatus::Delivered,
                order_date: Utc::now() - Duration::days(ordered_days_ago),
                order_products: vec![OrderProduct {
                    id: 1,
                    order_id: 100,
                    product_id: 55,
                    serial_number: "SN-55-001".to_string(),
                    price_cents: 15_000,
                }],
            })
            .await;
        store
            .add_item(
                55,
                &CreateProductItem {
                    serial_number: "SN-55-001".to_string(),
                    status: Some(ItemStatus::Sold),
                },
            )
            .await
            .unwrap();
        store
            .add_policy(
                55,
                &CreatePolicy {
                    policy_type: "30-day".to_string(),
                    duration_days: 30,
                },
            )
            .await
            .unwrap();
        build_router(AppState::new(store))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn open_body() -> Value {
        json!({
            "user_id": 7,
            "order_id": 100,
            "product_id": 55,
            "return_policy": "30-day",
            "reason": "Dead pixels"
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_with_order(1).await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn return_flow_over_http() {
        let app = app_with_order(10).await;

        let (status, body) = send(&app, Method::POST, "/api/returns", Some(open_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "Pending");
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/returns/{id}/serial-number"),
            Some(json!({ "serial_number": "SN-55-001" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Processing");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/returns/{id}/technical-review"),
            Some(json!({ "process": "Refurbish", "feedback": "?" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_input");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/returns/{id}/technical-review"),
            Some(json!({ "process": "Return Good", "feedback": "Works fine" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["process"], "Return Good");

        let (status, body) = send(&app, Method::GET, &format!("/api/returns/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["transactions"][0]["amount_cents"], 15_000);
        assert_eq!(body["data"]["product"]["id"], 55);
        assert_eq!(body["data"]["order"]["id"], 100);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/returns/{id}/close"),
            Some(json!({ "closed_by": 1, "feedback": "Refunded" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/api/returns", None).await;
        assert_eq!(body["count"], 0);
        let (_, body) = send(&app, Method::GET, "/api/users/7/returns", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["status"], "Closed");
    }

    #[tokio::test]
    async fn expired_policy_is_bad_request() {
        let app = app_with_order(31).await;
        let (status, body) = send(&app, Method::POST, "/api/returns", Some(open_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "policy_violation");
    }

    #[tokio::test]
    async fn missing_request_is_not_found() {
        let app = app_with_order(1).await;
        let (status, body) = send(&app, Method::GET, "/api/returns/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn item_status_endpoint_updates_units() {
        let app = app_with_order(1).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/items/SN-55-001/status",
            Some(json!({ "status": "Repaired" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Repaired");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/items/SN-missing/status",
            Some(json!({ "status": "Repaired" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn product_update_endpoint() {
        let app = app_with_order(1).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/products/55",
            Some(json!({ "price_cents": 14_000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["price_cents"], 14_000);
        assert_eq!(body["data"]["name"], "Smart Monitor");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/products/55",
            Some(json!({ "name": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_input");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/products/999",
            Some(json!({ "price_cents": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn seed_endpoint_populates_catalog() {
        let app = app_with_order(1).await;
        let (status, body) = send(&app, Method::POST, "/api/seed?count=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["seeded"]["products"], 2);

        let (_, body) = send(&app, Method::GET, "/api/products", None).await;
        assert_eq!(body["count"], 3);
    }
}

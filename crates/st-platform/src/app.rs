//! HTTP application assembly
//!
//! Combines the subscription routes, the health endpoint and the tower-http
//! middleware stack into a single axum router plus its OpenAPI document.

use std::time::Duration;

use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{openapi::OpenApi, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::subscription::{subscriptions_router, SubscriptionService, SubscriptionsState};

pub const API_BASE_PATH: &str = "/api/v1/subscriptions";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the application router and the collected OpenAPI document.
///
/// Requests running longer than `request_timeout` are answered with 408 and
/// their handler future is dropped, which abandons any in-flight store call.
pub fn build_app(service: SubscriptionService, request_timeout: Duration) -> (Router, OpenApi) {
    let (router, mut openapi) = OpenApiRouter::new()
        .nest(API_BASE_PATH, subscriptions_router(SubscriptionsState { service }))
        .split_for_parts();

    openapi.info.title = "Subtrack API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Subscription management and cost aggregation".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler));

    (with_middleware(app, request_timeout), openapi)
}

/// Timeout, tracing and request-id layers, outermost last.
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_middleware(slow, Duration::from_millis(20));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key("x-request-id"));
    }
}

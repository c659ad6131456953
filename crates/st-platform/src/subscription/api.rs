//! Subscriptions API
//!
//! REST endpoints for subscription management. Dates cross this boundary as
//! `MM-YYYY` strings.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use st_common::MonthDate;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{CostQuery, NewSubscription, Subscription, SubscriptionPatch};
use super::service::SubscriptionService;
use crate::shared::api_common::{ApiError, CreatedResponse, ErrorResponse, StatusResponse};
use crate::shared::context::CallerContext;

/// Create subscription request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    /// Name of the subscribed service
    #[schema(example = "Yandex Plus")]
    pub service_name: String,

    /// Monthly price in minor currency units
    #[schema(example = 400)]
    pub price: i64,

    /// Owning user
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,

    /// First active month, `MM-YYYY`
    #[schema(example = "07-2025")]
    pub start_date: String,
}

/// Partial update request. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub price: Option<i64>,

    /// Last active month, `MM-YYYY`
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSubscriptionsQuery {
    /// Owning user
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalCostQuery {
    pub user_id: Option<String>,

    /// Restrict to a single service; empty means all services
    pub service_name: Option<String>,

    /// Window start, `MM-YYYY`
    pub start_date: Option<String>,

    /// Window end, `MM-YYYY`
    pub end_date: Option<String>,
}

/// Subscription response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: String,
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    #[schema(example = "07-2025")]
    pub start_date: String,
    pub end_date: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_name: s.service_name,
            price: s.price,
            user_id: s.user_id,
            start_date: s.start_date.to_string(),
            end_date: s.end_date.map(|d| d.to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalCostResponse {
    pub total_cost: i64,
}

/// Subscriptions service state
#[derive(Clone)]
pub struct SubscriptionsState {
    pub service: SubscriptionService,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", field)))
}

fn parse_month(value: &str, field: &str) -> Result<MonthDate, ApiError> {
    MonthDate::parse(value).map_err(|e| ApiError::bad_request(format!("{}: {}", field, e)))
}

fn check_price(price: i64) -> Result<(), ApiError> {
    if price < 0 {
        return Err(ApiError::bad_request("price must not be negative"));
    }
    Ok(())
}

/// Create a new subscription
#[utoipa::path(
    post,
    path = "",
    tag = "subscriptions",
    operation_id = "createSubscription",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = CreatedResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn create_subscription(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    body: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = body?;

    if req.service_name.trim().is_empty() {
        return Err(ApiError::bad_request("service_name is required"));
    }
    if req.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    check_price(req.price)?;
    let start_date = parse_month(&req.start_date, "start_date")?;

    let id = state
        .service
        .create(&ctx, NewSubscription::new(req.service_name, req.price, req.user_id, start_date))
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

/// Get subscription by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "subscriptions",
    operation_id = "getSubscription",
    params(
        ("id" = String, Path, description = "Subscription ID")
    ),
    responses(
        (status = 200, description = "Subscription found", body = SubscriptionResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    )
)]
pub async fn get_subscription(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = state.service.get(&ctx, &id).await?;
    Ok(Json(subscription.into()))
}

/// List a user's subscriptions
#[utoipa::path(
    get,
    path = "",
    tag = "subscriptions",
    operation_id = "listSubscriptions",
    params(ListSubscriptionsQuery),
    responses(
        (status = 200, description = "Subscriptions of the user", body = [SubscriptionResponse]),
        (status = 400, description = "Missing user_id", body = ErrorResponse)
    )
)]
pub async fn list_subscriptions(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    query: Result<Query<ListSubscriptionsQuery>, QueryRejection>,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let Query(query) = query?;
    let user_id = required(&query.user_id, "user_id")?;

    let subscriptions = state.service.list(&ctx, user_id).await?;
    Ok(Json(subscriptions.into_iter().map(Into::into).collect()))
}

/// Partially update a subscription
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "subscriptions",
    operation_id = "updateSubscription",
    params(
        ("id" = String, Path, description = "Subscription ID")
    ),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = StatusResponse),
        (status = 400, description = "Validation error or end date before start date", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    )
)]
pub async fn update_subscription(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    Path(id): Path<String>,
    body: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = body?;

    let mut patch = SubscriptionPatch::new();
    if let Some(price) = req.price {
        check_price(price)?;
        patch = patch.with_price(price);
    }
    // An explicit null is indistinguishable from an omitted field
    if let Some(end_date) = req.end_date.as_deref() {
        patch = patch.with_end_date(parse_month(end_date, "end_date")?);
    }

    state.service.update(&ctx, &id, patch).await?;
    Ok(Json(StatusResponse::ok("subscription updated")))
}

/// Delete a subscription
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "subscriptions",
    operation_id = "deleteSubscription",
    params(
        ("id" = String, Path, description = "Subscription ID")
    ),
    responses(
        (status = 204, description = "Subscription deleted"),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    )
)]
pub async fn delete_subscription(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&ctx, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Total monthly cost of subscriptions overlapping a month window
#[utoipa::path(
    get,
    path = "/total-cost",
    tag = "subscriptions",
    operation_id = "getSubscriptionsTotalCost",
    params(TotalCostQuery),
    responses(
        (status = 200, description = "Sum of prices", body = TotalCostResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse)
    )
)]
pub async fn total_cost(
    State(state): State<SubscriptionsState>,
    ctx: CallerContext,
    query: Result<Query<TotalCostQuery>, QueryRejection>,
) -> Result<Json<TotalCostResponse>, ApiError> {
    let Query(query) = query?;

    let user_id = required(&query.user_id, "user_id")?;
    let start_date = parse_month(required(&query.start_date, "start_date")?, "start_date")?;
    let end_date = parse_month(required(&query.end_date, "end_date")?, "end_date")?;
    if start_date > end_date {
        return Err(ApiError::bad_request("start_date must not be after end_date"));
    }

    let mut cost_query = CostQuery::new(user_id, start_date, end_date);
    if let Some(service_name) = query.service_name {
        cost_query = cost_query.with_service_name(service_name);
    }

    let total_cost = state.service.total_cost(&ctx, &cost_query).await?;
    Ok(Json(TotalCostResponse { total_cost }))
}

/// Create subscriptions router
pub fn subscriptions_router(state: SubscriptionsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_subscription, list_subscriptions))
        .routes(routes!(total_cost))
        .routes(routes!(get_subscription, update_subscription, delete_subscription))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_missing_and_blank() {
        assert!(required(&None, "user_id").is_err());
        assert!(required(&Some("  ".to_string()), "user_id").is_err());
        assert_eq!(required(&Some("u1".to_string()), "user_id").unwrap(), "u1");
    }

    #[test]
    fn test_response_renders_month_strings() {
        let sub = NewSubscription::new("Netflix", 100, "user-1", MonthDate::new(2025, 7).unwrap())
            .into_subscription("sub-1");
        let response = SubscriptionResponse::from(sub);

        assert_eq!(response.start_date, "07-2025");
        assert_eq!(response.end_date, None);
    }
}

//! Role-gated dashboard surface. Every handler clears [`require_admin`]
//! before touching the store; these CRUD writes are the only mutation path
//! for products outside the checkout transaction.

use crate::auth::require_admin;
use crate::http::handlers::{
    error_json, propagated_request_id, respond_error, with_request_id,
};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pluggin_api::{
    order_dto, product_dto, AdminOrderDto, ApiErrorCode, OrderStatusUpdateDto, ProductUpsertDto,
};
use pluggin_model::{OrderStatus, ProductDraft};
use serde_json::json;
use std::time::Instant;
use tracing::info;

fn draft_from_dto(dto: &ProductUpsertDto) -> Result<ProductDraft, String> {
    ProductDraft::parse(
        &dto.name,
        dto.price,
        &dto.image,
        dto.quantity,
        dto.discount_percentage,
        dto.is_on_sale,
        dto.category.as_deref(),
        dto.is_sold_out,
    )
    .map_err(|e| e.to_string())
}

async fn gate(state: &AppState, headers: &HeaderMap, request_id: &str) -> Result<(), Response> {
    match require_admin(state, headers).await {
        Ok(claims) => {
            info!(request_id = %request_id, admin = %claims.email, "admin request authorized");
            Ok(())
        }
        Err(err) => Err(respond_error(err, request_id)),
    }
}

pub(crate) async fn create_product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ProductUpsertDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = match gate(&state, &headers, &request_id).await {
        Err(denied) => denied,
        Ok(()) => match draft_from_dto(&body) {
            Err(message) => respond_error(
                error_json(ApiErrorCode::ValidationFailed, &message, json!({})),
                &request_id,
            ),
            Ok(draft) => match state.store.create_product(draft).await {
                Ok(product) => {
                    with_request_id(Json(product_dto(&product)).into_response(), &request_id)
                }
                Err(e) => respond_error(
                    error_json(
                        ApiErrorCode::Internal,
                        "product create failed",
                        json!({"message": e.to_string()}),
                    ),
                    &request_id,
                ),
            },
        },
    };
    state
        .metrics
        .observe_request("/v1/admin/products", resp.status(), started.elapsed())
        .await;
    resp
}

pub(crate) async fn update_product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ProductUpsertDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = match gate(&state, &headers, &request_id).await {
        Err(denied) => denied,
        Ok(()) => match draft_from_dto(&body) {
            Err(message) => respond_error(
                error_json(ApiErrorCode::ValidationFailed, &message, json!({})),
                &request_id,
            ),
            Ok(draft) => match state.store.update_product(id, draft).await {
                Ok(Some(product)) => {
                    with_request_id(Json(product_dto(&product)).into_response(), &request_id)
                }
                Ok(None) => respond_error(
                    error_json(
                        ApiErrorCode::ProductNotFound,
                        &format!("product {id} not found"),
                        json!({"product_id": id}),
                    ),
                    &request_id,
                ),
                Err(e) => respond_error(
                    error_json(
                        ApiErrorCode::Internal,
                        "product update failed",
                        json!({"message": e.to_string()}),
                    ),
                    &request_id,
                ),
            },
        },
    };
    state
        .metrics
        .observe_request(
            "/v1/admin/products/{id}",
            resp.status(),
            started.elapsed(),
        )
        .await;
    resp
}

pub(crate) async fn delete_product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = match gate(&state, &headers, &request_id).await {
        Err(denied) => denied,
        Ok(()) => match state.store.delete_product(id).await {
            Ok(true) => with_request_id(
                Json(json!({"success": true})).into_response(),
                &request_id,
            ),
            Ok(false) => respond_error(
                error_json(
                    ApiErrorCode::ProductNotFound,
                    &format!("product {id} not found"),
                    json!({"product_id": id}),
                ),
                &request_id,
            ),
            Err(e) => respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "product delete failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            ),
        },
    };
    state
        .metrics
        .observe_request(
            "/v1/admin/products/{id}",
            resp.status(),
            started.elapsed(),
        )
        .await;
    resp
}

pub(crate) async fn orders_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = match gate(&state, &headers, &request_id).await {
        Err(denied) => denied,
        Ok(()) => match state.store.list_orders().await {
            Ok(rows) => {
                let payload: Vec<AdminOrderDto> = rows
                    .iter()
                    .map(|row| AdminOrderDto {
                        order: order_dto(&row.order),
                        product_name: row.product_name.clone(),
                    })
                    .collect();
                with_request_id(Json(payload).into_response(), &request_id)
            }
            Err(e) => respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "order listing failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            ),
        },
    };
    state
        .metrics
        .observe_request("/v1/admin/orders", resp.status(), started.elapsed())
        .await;
    resp
}

pub(crate) async fn order_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<OrderStatusUpdateDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = match gate(&state, &headers, &request_id).await {
        Err(denied) => denied,
        Ok(()) => match OrderStatus::parse(&body.status) {
            Err(e) => respond_error(
                error_json(ApiErrorCode::ValidationFailed, &e.to_string(), json!({})),
                &request_id,
            ),
            Ok(status) => match state.store.update_order_status(id, status).await {
                Ok(true) => with_request_id(
                    Json(json!({"success": true, "status": status.as_str()})).into_response(),
                    &request_id,
                ),
                Ok(false) => respond_error(
                    error_json(
                        ApiErrorCode::OrderNotFound,
                        &format!("order {id} not found"),
                        json!({"order_id": id}),
                    ),
                    &request_id,
                ),
                Err(e) => respond_error(
                    error_json(
                        ApiErrorCode::Internal,
                        "order status update failed",
                        json!({"message": e.to_string()}),
                    ),
                    &request_id,
                ),
            },
        },
    };
    state
        .metrics
        .observe_request(
            "/v1/admin/orders/{id}/status",
            resp.status(),
            started.elapsed(),
        )
        .await;
    resp
}

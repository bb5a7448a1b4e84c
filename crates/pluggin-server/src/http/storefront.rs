use crate::http::handlers::{
    error_json, propagated_request_id, respond_error, with_request_id,
};
use crate::mailer::welcome_email;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pluggin_api::{
    order_dto, product_dto, ApiErrorCode, CheckoutRequestDto, CheckoutResponseDto,
    NewsletterSubscribeDto, ShippingAddressRequestDto, ShippingAddressResponseDto,
    SubscribeResponseDto,
};
use pluggin_model::{
    CustomerName, EmailAddress, LineItem, ProductCategory, ShippingAddressDraft,
};
use pluggin_store::{CheckoutError, ShippingError, SubscribeError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{info, warn};

pub(crate) async fn products_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let category = match params.get("category").map(String::as_str) {
        None => None,
        Some(raw) => match ProductCategory::parse(raw) {
            Ok(cat) => Some(cat),
            Err(e) => {
                let resp = respond_error(
                    error_json(
                        ApiErrorCode::ValidationFailed,
                        &e.to_string(),
                        json!({"parameter": "category"}),
                    ),
                    &request_id,
                );
                state
                    .metrics
                    .observe_request("/v1/products", StatusCode::BAD_REQUEST, started.elapsed())
                    .await;
                return resp;
            }
        },
    };

    match state.store.list_products(category).await {
        Ok(products) => {
            let payload: Vec<_> = products.iter().map(product_dto).collect();
            let resp = with_request_id(Json(payload).into_response(), &request_id);
            state
                .metrics
                .observe_request("/v1/products", StatusCode::OK, started.elapsed())
                .await;
            resp
        }
        Err(e) => {
            let resp = respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "catalog read failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            );
            state
                .metrics
                .observe_request(
                    "/v1/products",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            resp
        }
    }
}

pub(crate) async fn product_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let (status, resp) = match state.store.get_product(id).await {
        Ok(Some(product)) => (
            StatusCode::OK,
            with_request_id(Json(product_dto(&product)).into_response(), &request_id),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            respond_error(
                error_json(
                    ApiErrorCode::ProductNotFound,
                    &format!("product {id} not found"),
                    json!({"product_id": id}),
                ),
                &request_id,
            ),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "catalog read failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            ),
        ),
    };
    state
        .metrics
        .observe_request("/v1/products/{id}", status, started.elapsed())
        .await;
    resp
}

fn checkout_error_to_api(err: &CheckoutError) -> (ApiErrorCode, serde_json::Value) {
    match err {
        CheckoutError::EmptyBatch => (ApiErrorCode::ValidationFailed, json!({})),
        CheckoutError::ProductNotFound { product_id } => (
            ApiErrorCode::ProductNotFound,
            json!({"product_id": product_id}),
        ),
        CheckoutError::SoldOut { product_id, name } => (
            ApiErrorCode::SoldOut,
            json!({"product_id": product_id, "name": name}),
        ),
        CheckoutError::InsufficientStock {
            product_id,
            name,
            available,
            requested,
        } => (
            ApiErrorCode::InsufficientStock,
            json!({
                "product_id": product_id,
                "name": name,
                "available": available,
                "requested": requested
            }),
        ),
        CheckoutError::Storage(_) => (ApiErrorCode::Internal, json!({})),
    }
}

/// The order transaction entry point. Input validation happens here; the
/// all-or-nothing commit itself lives in the store.
pub(crate) async fn checkout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CheckoutRequestDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    info!(request_id = %request_id, items = body.items.len(), "checkout request start");

    let reject = |code: ApiErrorCode, message: &str, details: serde_json::Value| {
        respond_error(error_json(code, message, details), &request_id)
    };

    if body.items.is_empty() {
        let resp = reject(
            ApiErrorCode::ValidationFailed,
            "items array is required and cannot be empty",
            json!({}),
        );
        state
            .metrics
            .observe_request("/v1/checkout", StatusCode::BAD_REQUEST, started.elapsed())
            .await;
        return resp;
    }
    let customer_name = match CustomerName::parse(&body.customer_name) {
        Ok(v) => v,
        Err(e) => {
            let resp = reject(ApiErrorCode::ValidationFailed, &e.to_string(), json!({}));
            state
                .metrics
                .observe_request("/v1/checkout", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return resp;
        }
    };
    let user_id = body.user_id.trim().to_string();
    if user_id.is_empty() {
        let resp = reject(
            ApiErrorCode::ValidationFailed,
            "customer name and user id are required",
            json!({}),
        );
        state
            .metrics
            .observe_request("/v1/checkout", StatusCode::BAD_REQUEST, started.elapsed())
            .await;
        return resp;
    }
    let mut items = Vec::with_capacity(body.items.len());
    for (index, item) in body.items.iter().enumerate() {
        match LineItem::parse(item.product_id, item.quantity, item.price) {
            Ok(parsed) => items.push(parsed),
            Err(e) => {
                let resp = reject(
                    ApiErrorCode::ValidationFailed,
                    &e.to_string(),
                    json!({"item_index": index}),
                );
                state
                    .metrics
                    .observe_request("/v1/checkout", StatusCode::BAD_REQUEST, started.elapsed())
                    .await;
                return resp;
            }
        }
    }

    let commit = state
        .store
        .commit_checkout(items, customer_name, user_id.clone());
    let (status, resp) = match timeout(state.api.request_timeout, commit).await {
        Ok(Ok(orders)) => {
            info!(
                request_id = %request_id,
                user_id = %user_id,
                order_count = orders.len(),
                "checkout committed"
            );
            let payload = CheckoutResponseDto {
                success: true,
                orders: orders.iter().map(order_dto).collect(),
            };
            (
                StatusCode::OK,
                with_request_id(Json(payload).into_response(), &request_id),
            )
        }
        Ok(Err(err)) => {
            warn!(request_id = %request_id, error = %err, "checkout rejected");
            let (code, details) = checkout_error_to_api(&err);
            let status = StatusCode::from_u16(pluggin_api::map_error_status(code).status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, reject(code, &err.to_string(), details))
        }
        Err(_) => {
            warn!(request_id = %request_id, "checkout timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                reject(ApiErrorCode::Internal, "checkout timed out", json!({})),
            )
        }
    };
    state
        .metrics
        .observe_request("/v1/checkout", status, started.elapsed())
        .await;
    resp
}

pub(crate) async fn shipping_address_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ShippingAddressRequestDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let draft = match ShippingAddressDraft::parse(
        body.order_id,
        &body.name,
        &body.email,
        body.phone.as_deref(),
        &body.address,
        &body.city,
        &body.zip_code,
    ) {
        Ok(v) => v,
        Err(e) => {
            let resp = respond_error(
                error_json(ApiErrorCode::ValidationFailed, &e.to_string(), json!({})),
                &request_id,
            );
            state
                .metrics
                .observe_request(
                    "/v1/shipping-addresses",
                    StatusCode::BAD_REQUEST,
                    started.elapsed(),
                )
                .await;
            return resp;
        }
    };

    let (status, resp) = match state.store.insert_shipping_address(draft).await {
        Ok(address) => (
            StatusCode::OK,
            with_request_id(
                Json(ShippingAddressResponseDto {
                    success: true,
                    id: address.id,
                    order_id: address.order_id,
                })
                .into_response(),
                &request_id,
            ),
        ),
        Err(ShippingError::OrderNotFound { order_id }) => (
            StatusCode::NOT_FOUND,
            respond_error(
                error_json(
                    ApiErrorCode::OrderNotFound,
                    &format!("order {order_id} not found"),
                    json!({"order_id": order_id}),
                ),
                &request_id,
            ),
        ),
        Err(ShippingError::AlreadyRecorded { order_id }) => (
            StatusCode::CONFLICT,
            respond_error(
                error_json(
                    ApiErrorCode::AddressAlreadyRecorded,
                    &format!("order {order_id} already has a shipping address"),
                    json!({"order_id": order_id}),
                ),
                &request_id,
            ),
        ),
        Err(ShippingError::Storage(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "shipping address write failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            ),
        ),
    };
    state
        .metrics
        .observe_request("/v1/shipping-addresses", status, started.elapsed())
        .await;
    resp
}

pub(crate) async fn newsletter_subscribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NewsletterSubscribeDto>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    let email = match EmailAddress::parse(&body.email) {
        Ok(v) => v,
        Err(e) => {
            let resp = respond_error(
                error_json(ApiErrorCode::ValidationFailed, &e.to_string(), json!({})),
                &request_id,
            );
            state
                .metrics
                .observe_request(
                    "/v1/newsletter/subscribe",
                    StatusCode::BAD_REQUEST,
                    started.elapsed(),
                )
                .await;
            return resp;
        }
    };

    let (status, resp) = match state.store.subscribe_newsletter(email.clone()).await {
        Ok(_) => {
            // Welcome delivery never blocks or fails the subscription.
            let mailer = Arc::clone(&state.mailer);
            let to = email.as_str().to_string();
            tokio::spawn(async move {
                let (subject, html) = welcome_email();
                if let Err(e) = mailer.send(&to, &subject, &html).await {
                    warn!(error = %e, "welcome email delivery failed");
                }
            });
            (
                StatusCode::OK,
                with_request_id(
                    Json(SubscribeResponseDto { success: true }).into_response(),
                    &request_id,
                ),
            )
        }
        Err(SubscribeError::AlreadySubscribed) => (
            StatusCode::CONFLICT,
            respond_error(
                error_json(
                    ApiErrorCode::AlreadySubscribed,
                    "email is already subscribed",
                    json!({}),
                ),
                &request_id,
            ),
        ),
        Err(SubscribeError::Storage(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            respond_error(
                error_json(
                    ApiErrorCode::Internal,
                    "newsletter write failed",
                    json!({"message": e.to_string()}),
                ),
                &request_id,
            ),
        ),
    };
    state
        .metrics
        .observe_request("/v1/newsletter/subscribe", status, started.elapsed())
        .await;
    resp
}

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use pluggin_store::ShopStore;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

mod auth;
mod config;
mod http;
mod mailer;
mod rate_limiter;
mod telemetry;

pub use config::{validate_startup_config_contract, ApiConfig, RateLimitConfig};
pub use mailer::{MailError, Mailer, NoopMailer, RecordingMailer, ResendMailer, SentEmail};

pub const CRATE_NAME: &str = "pluggin-server";

use rate_limiter::RateLimiter;
use telemetry::RequestMetrics;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ShopStore>,
    pub api: ApiConfig,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) otp_limiter: Arc<RateLimiter>,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<ShopStore>) -> Self {
        Self::with_config(store, ApiConfig::default(), Arc::new(NoopMailer))
    }

    #[must_use]
    pub fn with_config(store: Arc<ShopStore>, api: ApiConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            api,
            mailer,
            otp_limiter: Arc::new(RateLimiter::default()),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(parsed))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.api.cors_allowed_origins);
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/v1/products", get(http::storefront::products_handler))
        .route("/v1/products/:id", get(http::storefront::product_handler))
        .route("/v1/checkout", post(http::storefront::checkout_handler))
        .route(
            "/v1/shipping-addresses",
            post(http::storefront::shipping_address_handler),
        )
        .route(
            "/v1/newsletter/subscribe",
            post(http::storefront::newsletter_subscribe_handler),
        )
        .route("/v1/auth/otp/send", post(http::auth_endpoints::otp_send_handler))
        .route(
            "/v1/auth/otp/verify",
            post(http::auth_endpoints::otp_verify_handler),
        )
        .route("/v1/admin/products", post(http::admin::create_product_handler))
        .route(
            "/v1/admin/products/:id",
            put(http::admin::update_product_handler).delete(http::admin::delete_product_handler),
        )
        .route("/v1/admin/orders", get(http::admin::orders_handler))
        .route(
            "/v1/admin/orders/:id/status",
            put(http::admin::order_status_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .layer(cors)
        .with_state(state)
}

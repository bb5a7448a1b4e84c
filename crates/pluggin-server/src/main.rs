#![forbid(unsafe_code)]

use pluggin_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState, Mailer, NoopMailer,
    RateLimitConfig, ResendMailer,
};
use pluggin_store::ShopStore;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("PLUGGIN_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("PLUGGIN_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let db_path = env::var(pluggin_core::ENV_PLUGGIN_DB_PATH)
        .unwrap_or_else(|_| "artifacts/shop.sqlite".to_string());

    let api = ApiConfig {
        max_body_bytes: env_usize("PLUGGIN_MAX_BODY_BYTES", 16 * 1024),
        request_timeout: env_duration_ms("PLUGGIN_REQUEST_TIMEOUT_MS", 5000),
        session_secret: env::var(pluggin_core::ENV_PLUGGIN_SESSION_SECRET).ok(),
        session_ttl: Duration::from_secs(env_u64(
            "PLUGGIN_SESSION_TTL_SECS",
            30 * 24 * 60 * 60,
        )),
        otp_ttl: Duration::from_secs(env_u64("PLUGGIN_OTP_TTL_SECS", 600)),
        admin_emails: env_list("PLUGGIN_ADMIN_EMAILS"),
        otp_rate_limit: RateLimitConfig {
            capacity: env_f64("PLUGGIN_OTP_RATE_LIMIT_CAPACITY", 5.0),
            refill_per_sec: env_f64("PLUGGIN_OTP_RATE_LIMIT_REFILL_PER_SEC", 0.1),
        },
        cors_allowed_origins: env_list("PLUGGIN_CORS_ALLOWED_ORIGINS"),
        resend_api_key: env::var("PLUGGIN_RESEND_API_KEY").ok(),
        email_from: env::var("PLUGGIN_EMAIL_FROM")
            .unwrap_or_else(|_| "PLUGG'IN <onboarding@resend.dev>".to_string()),
    };
    validate_startup_config_contract(&api)?;

    let store = ShopStore::open(&db_path)
        .await
        .map_err(|e| format!("failed to open store at {db_path}: {e}"))?;
    info!(db_path = %db_path, "store opened");

    let mailer: Arc<dyn Mailer> = match api.resend_api_key.clone() {
        Some(key) if !key.is_empty() => {
            Arc::new(ResendMailer::new(key, api.email_from.clone()))
        }
        _ => {
            warn!("no mail delivery key configured; emails will be dropped");
            Arc::new(NoopMailer)
        }
    };

    let state = AppState::with_config(store, api, mailer);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind failed on {bind_addr}: {e}"))?;
    info!("pluggin-server listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}

use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5.0,
            refill_per_sec: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    /// Ceiling on one store round-trip inside a handler; the hosting
    /// platform's own timeout is the outer bound.
    pub request_timeout: Duration,
    pub session_secret: Option<String>,
    pub session_ttl: Duration,
    pub otp_ttl: Duration,
    /// Addresses granted the admin role when they complete OTP login.
    /// Authorization itself is always the role-table lookup.
    pub admin_emails: Vec<String>,
    pub otp_rate_limit: RateLimitConfig,
    pub cors_allowed_origins: Vec<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            request_timeout: Duration::from_secs(5),
            session_secret: None,
            session_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            otp_ttl: Duration::from_secs(600),
            admin_emails: Vec::new(),
            otp_rate_limit: RateLimitConfig::default(),
            cors_allowed_origins: Vec::new(),
            resend_api_key: None,
            email_from: "PLUGG'IN <onboarding@resend.dev>".to_string(),
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if api.request_timeout.is_zero() || api.otp_ttl.is_zero() || api.session_ttl.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if !api.admin_emails.is_empty()
        && api.session_secret.as_deref().map_or(true, str::is_empty)
    {
        return Err(
            "admin emails configured without a session secret; the admin surface would be unreachable"
                .to_string(),
        );
    }
    if api.otp_rate_limit.capacity <= 0.0 || api.otp_rate_limit.refill_per_sec <= 0.0 {
        return Err("otp rate limit must have positive capacity and refill".to_string());
    }
    Ok(())
}

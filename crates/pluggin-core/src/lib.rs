#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CRATE_NAME: &str = "pluggin-core";

pub const ENV_PLUGGIN_DB_PATH: &str = "PLUGGIN_DB_PATH";
pub const ENV_PLUGGIN_SESSION_SECRET: &str = "PLUGGIN_SESSION_SECRET";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Seconds since the Unix epoch. Clock errors collapse to 0 rather than
/// panicking; every caller treats timestamps as advisory ordering data.
#[must_use]
pub fn unix_now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Lowercase and trim an email-shaped key so lookups and role grants agree
/// on one canonical spelling.
#[must_use]
pub fn normalize_email_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

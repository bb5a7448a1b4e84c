use crate::{storage, ShopStore, StoreError};
use pluggin_model::{EmailAddress, NewsletterSubscriber, Profile, Role};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use std::fmt::{Display, Formatter};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    AlreadySubscribed,
    Storage(StoreError),
}

impl Display for SubscribeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySubscribed => write!(f, "email is already subscribed"),
            Self::Storage(e) => write!(f, "newsletter write failed: {e}"),
        }
    }
}

impl std::error::Error for SubscribeError {}

impl From<StoreError> for SubscribeError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl ShopStore {
    pub async fn subscribe_newsletter(
        &self,
        email: EmailAddress,
    ) -> Result<NewsletterSubscriber, SubscribeError> {
        let now = pluggin_core::unix_now_secs();
        self.write_with(move |conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM newsletter_subscribers WHERE email = ?1",
                    params![email.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)?;
            if existing.is_some() {
                return Err(SubscribeError::AlreadySubscribed);
            }
            conn.execute(
                "INSERT INTO newsletter_subscribers (email, created_at) VALUES (?1, ?2)",
                params![email.as_str(), now],
            )
            .map_err(storage)?;
            let id = conn.last_insert_rowid();
            info!(subscriber_id = id, "newsletter subscriber added");
            Ok(NewsletterSubscriber {
                id,
                email,
                created_at: now,
            })
        })
        .await
    }

    /// Stores a fresh login code for the email: prior unused codes are
    /// dropped first, so at most one code is live per address. Only the
    /// SHA-256 of the code is persisted.
    pub async fn issue_otp(
        &self,
        email: EmailAddress,
        code_hash: String,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        let now = pluggin_core::unix_now_secs();
        self.write(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage)?;
            tx.execute(
                "DELETE FROM user_otps WHERE email = ?1 AND used = 0",
                params![email.as_str()],
            )
            .map_err(storage)?;
            tx.execute(
                "INSERT INTO user_otps (email, code_hash, expires_at, used, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                params![email.as_str(), code_hash, now + ttl_secs, now],
            )
            .map_err(storage)?;
            tx.commit().map_err(storage)?;
            info!(email = %email, "login code issued");
            Ok(())
        })
        .await
    }

    /// Consumes a login code: expired rows are purged, then the newest
    /// unused match is marked used. Returns `false` for a wrong, expired or
    /// replayed code.
    pub async fn consume_otp(
        &self,
        email: EmailAddress,
        code_hash: String,
    ) -> Result<bool, StoreError> {
        let now = pluggin_core::unix_now_secs();
        self.write(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage)?;
            tx.execute(
                "DELETE FROM user_otps WHERE expires_at < ?1",
                params![now],
            )
            .map_err(storage)?;
            let row: Option<i64> = tx
                .query_row(
                    "SELECT id FROM user_otps
                     WHERE email = ?1 AND code_hash = ?2 AND used = 0 AND expires_at >= ?3
                     ORDER BY created_at DESC LIMIT 1",
                    params![email.as_str(), code_hash, now],
                    |r| r.get(0),
                )
                .optional()
                .map_err(storage)?;
            let Some(id) = row else {
                tx.commit().map_err(storage)?;
                return Ok(false);
            };
            tx.execute("UPDATE user_otps SET used = 1 WHERE id = ?1", params![id])
                .map_err(storage)?;
            tx.commit().map_err(storage)?;
            Ok(true)
        })
        .await
    }

    /// Fetches the profile for an email, creating it (uuid v4 identity) on
    /// first login.
    pub async fn ensure_profile(&self, email: EmailAddress) -> Result<Profile, StoreError> {
        let now = pluggin_core::unix_now_secs();
        self.write(move |conn| {
            let existing = conn
                .query_row(
                    "SELECT id, email, username, created_at, updated_at FROM profiles WHERE email = ?1",
                    params![email.as_str()],
                    |row| {
                        Ok(Profile {
                            id: row.get(0)?,
                            email: email.clone(),
                            username: row.get(2)?,
                            created_at: row.get(3)?,
                            updated_at: row.get(4)?,
                        })
                    },
                )
                .optional()
                .map_err(storage)?;
            if let Some(profile) = existing {
                return Ok(profile);
            }
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO profiles (id, email, username, created_at, updated_at)
                 VALUES (?1, ?2, NULL, ?3, ?3)",
                params![id, email.as_str(), now],
            )
            .map_err(storage)?;
            info!(user_id = %id, "profile created");
            Ok(Profile {
                id,
                email,
                username: None,
                created_at: now,
                updated_at: now,
            })
        })
        .await
    }

    pub async fn grant_role(&self, user_id: String, role: Role) -> Result<(), StoreError> {
        let now = pluggin_core::unix_now_secs();
        self.write(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_roles (user_id, role, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, role.as_str(), now],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    pub async fn has_role(&self, user_id: String, role: Role) -> Result<bool, StoreError> {
        self.read(move |conn| {
            let hit: Option<i64> = conn
                .query_row(
                    "SELECT id FROM user_roles WHERE user_id = ?1 AND role = ?2",
                    params![user_id, role.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)?;
            Ok(hit.is_some())
        })
        .await
    }
}

use anyhow::Result;
use rand::rngs::OsRng;
use rand::Rng;
use uuid::Uuid;

use super::Db;

/// A token which can be used to authenticate as a user.
pub struct SessionToken;

/// A single-use token which can be exchanged for a session.
pub struct LoginToken;

impl SessionToken {
    /// Create a new session token for a user.
    pub async fn create(db: &Db, user_id: Uuid) -> Result<String> {
        let token = format!("{:032x}", OsRng.r#gen::<u128>());

        sqlx::query("INSERT INTO session_tokens (user_id, token) VALUES (?, ?)")
            .bind(user_id)
            .bind(&token)
            .execute(db)
            .await?;

        Ok(token)
    }

    /// Invalidate a session token. Unknown tokens are ignored.
    pub async fn delete(db: &Db, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_tokens WHERE token = ?")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl LoginToken {
    /// Register a login token issued out-of-band for a user.
    pub async fn insert(db: &Db, user_id: Uuid, token: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO login_tokens (user_id, token) VALUES (?, ?)")
            .bind(user_id)
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Mark a login token as used, returning its user if it was still valid.
    pub async fn redeem(db: &Db, token: &str) -> Result<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE login_tokens \
             SET used_at = CURRENT_TIMESTAMP \
             WHERE token = ? AND used_at IS NULL \
             RETURNING user_id",
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user_id)
    }
}

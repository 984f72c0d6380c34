use anyhow::Result;
use uuid::Uuid;

use super::Db;

/// An authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

impl User {
    /// Create a new user.
    pub async fn create(db: &Db, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, email) VALUES (?, ?)")
            .bind(user.id)
            .bind(&user.email)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Lookup a user by id, if one exists.
    pub async fn lookup(db: &Db, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>("SELECT id, email FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// Lookup a user by a session token, if it's valid.
    pub async fn lookup_by_session_token(db: &Db, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.email \
             FROM session_tokens t \
             JOIN users u on u.id = t.user_id \
             WHERE t.token = ?",
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

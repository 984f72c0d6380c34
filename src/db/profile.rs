use anyhow::Result;
use sqlx::error::ErrorKind;
use uuid::Uuid;

use super::Db;

/// The user-editable part of an account, keyed by the user's id.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow, serde::Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: Option<String>,
    pub website: Option<String>,
}

/// Values submitted from the account form, written verbatim.
#[derive(Debug, serde::Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub website: String,
}

/// Result of a profile update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub affected_count: u64,
    pub records: Vec<Profile>,
}

/// Why the store rejected a profile update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileErrorCode {
    /// The `usernamelength` check failed.
    UsernameTooShort,
    /// Another profile already has this username.
    UsernameTaken,
    Other,
}

impl ProfileErrorCode {
    /// Name of the check constraint enforcing the minimum username length.
    pub const USERNAME_LENGTH: &'static str = "usernamelength";
    /// Name of the unique index on profile usernames.
    pub const USERNAME_KEY: &'static str = "Profile_username_key";

    /// Scan error messages in order, the first one naming a known constraint wins.
    pub fn classify<'a>(messages: impl IntoIterator<Item = &'a str>) -> Self {
        for message in messages {
            if message.contains(Self::USERNAME_LENGTH) {
                return Self::UsernameTooShort;
            }
            if message.contains(Self::USERNAME_KEY) {
                return Self::UsernameTaken;
            }
        }
        Self::Other
    }

    /// Classify an error returned by the database driver.
    pub fn from_sqlx(err: &sqlx::Error) -> Self {
        let sqlx::Error::Database(db_err) = err else {
            return Self::Other;
        };

        let code = Self::classify([Some(db_err.message()), db_err.constraint()].into_iter().flatten());
        if code != Self::Other {
            return code;
        }

        // sqlite reports unique violations by column, e.g. `UNIQUE constraint failed: profiles.username`
        match db_err.kind() {
            ErrorKind::UniqueViolation if db_err.message().contains("username") => Self::UsernameTaken,
            _ => Self::Other,
        }
    }

    /// Message to show next to the form, if this is an error the user can fix.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::UsernameTooShort => Some("Username must have a minimum length of 3 characters."),
            Self::UsernameTaken => Some("The name is already taken."),
            Self::Other => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("updating profile ({code:?}): {source}")]
pub struct ProfileUpdateError {
    pub code: ProfileErrorCode,
    #[source]
    source: sqlx::Error,
}

impl From<sqlx::Error> for ProfileUpdateError {
    fn from(source: sqlx::Error) -> Self {
        Self { code: ProfileErrorCode::from_sqlx(&source), source }
    }
}

impl Profile {
    /// Create a new profile.
    pub async fn create(db: &Db, profile: &Profile) -> Result<()> {
        sqlx::query("INSERT INTO profiles (id, username, website) VALUES (?, ?, ?)")
            .bind(profile.id)
            .bind(&profile.username)
            .bind(&profile.website)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Lookup the profile with exactly this id, if one exists.
    pub async fn lookup(db: &Db, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>("SELECT id, username, website FROM profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// Set the username and website of the profile with this id.
    pub async fn update(
        db: &Db, id: Uuid, update: &ProfileUpdate,
    ) -> Result<UpdateOutcome, ProfileUpdateError> {
        let records = sqlx::query_as::<_, Profile>(
            "UPDATE profiles \
             SET username = ?, website = ? \
             WHERE id = ? \
             RETURNING id, username, website",
        )
        .bind(&update.username)
        .bind(&update.website)
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(UpdateOutcome { affected_count: records.len() as u64, records })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::db::user::User;

    async fn db_with_profile(username: &str) -> (Db, Profile) {
        let db = crate::db::init_in_memory().await.unwrap();
        let profile = Profile { id: Uuid::now_v7(), username: Some(username.into()), website: None };
        User::create(&db, &User { id: profile.id, email: format!("{username}@example.com") })
            .await
            .unwrap();
        Profile::create(&db, &profile).await.unwrap();
        (db, profile)
    }

    #[rstest]
    #[case(vec!["new row violates check constraint \"usernamelength\""], ProfileErrorCode::UsernameTooShort)]
    #[case(
        vec!["duplicate key value violates unique constraint \"Profile_username_key\""],
        ProfileErrorCode::UsernameTaken
    )]
    #[case(vec!["permission denied", "Profile_username_key"], ProfileErrorCode::UsernameTaken)]
    #[case(vec!["Profile_username_key", "usernamelength"], ProfileErrorCode::UsernameTaken)]
    #[case(vec!["connection reset"], ProfileErrorCode::Other)]
    #[case(vec![], ProfileErrorCode::Other)]
    fn classifies_messages_in_order(#[case] messages: Vec<&str>, #[case] expected: ProfileErrorCode) {
        assert_eq!(ProfileErrorCode::classify(messages), expected);
    }

    #[test]
    fn only_known_codes_have_messages() {
        assert_eq!(
            ProfileErrorCode::UsernameTooShort.user_message(),
            Some("Username must have a minimum length of 3 characters.")
        );
        assert_eq!(ProfileErrorCode::UsernameTaken.user_message(), Some("The name is already taken."));
        assert_eq!(ProfileErrorCode::Other.user_message(), None);
        assert_eq!(ProfileErrorCode::from_sqlx(&sqlx::Error::RowNotFound), ProfileErrorCode::Other);
    }

    #[tokio::test]
    async fn lookup_matches_exact_id() {
        let (db, profile) = db_with_profile("alice").await;
        assert_eq!(Profile::lookup(&db, profile.id).await.unwrap(), Some(profile));
        assert_eq!(Profile::lookup(&db, Uuid::now_v7()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_returns_affected_records() {
        let (db, profile) = db_with_profile("alice").await;
        let update = ProfileUpdate { username: "bob".into(), website: "b.com".into() };

        let outcome = Profile::update(&db, profile.id, &update).await.unwrap();
        assert_eq!(outcome.affected_count, 1);
        assert_eq!(
            outcome.records,
            vec![Profile { id: profile.id, username: Some("bob".into()), website: Some("b.com".into()) }]
        );
    }

    #[tokio::test]
    async fn short_username_is_rejected_by_the_store() {
        let (db, profile) = db_with_profile("alice").await;
        let update = ProfileUpdate { username: "ab".into(), website: "".into() };

        let err = Profile::update(&db, profile.id, &update).await.unwrap_err();
        assert_eq!(err.code, ProfileErrorCode::UsernameTooShort);
        assert_eq!(Profile::lookup(&db, profile.id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_by_the_store() {
        let (db, alice) = db_with_profile("alice").await;
        let bob = Profile { id: Uuid::now_v7(), username: Some("bob".into()), website: None };
        User::create(&db, &User { id: bob.id, email: "bob@example.com".into() }).await.unwrap();
        Profile::create(&db, &bob).await.unwrap();

        let update = ProfileUpdate { username: "bob".into(), website: "".into() };
        let err = Profile::update(&db, alice.id, &update).await.unwrap_err();
        assert_eq!(err.code, ProfileErrorCode::UsernameTaken);
    }
}

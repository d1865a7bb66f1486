use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use time::OffsetDateTime;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, profile_picture, completed_onboarding, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub completed_onboarding: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserAccount {
    /// Name used when greeting the user.
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub completed_onboarding: Option<bool>,
}

/// The account row for an identity-provider subject, created on first sight.
pub async fn upsert<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    email: Option<&str>,
) -> anyhow::Result<UserAccount> {
    let user = sqlx::query_as::<_, UserAccount>(&format!(
        r#"
        INSERT INTO users (id, email)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(email)
    .fetch_one(db)
    .await
    .context("upsert user")?;
    Ok(user)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    u: &UserUpdate,
) -> anyhow::Result<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>(&format!(
        r#"
        UPDATE users
           SET display_name         = COALESCE($2, display_name),
               profile_picture      = COALESCE($3, profile_picture),
               completed_onboarding = COALESCE($4, completed_onboarding)
         WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&u.display_name)
    .bind(&u.profile_picture)
    .bind(u.completed_onboarding)
    .fetch_optional(db)
    .await
    .context("update user")?;
    Ok(user)
}

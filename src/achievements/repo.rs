use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use crate::dates::iso_date;
use crate::enums::text_enum;
use crate::error::ValidationError;

text_enum! {
    pub enum AchievementKind {
        Streak => "streak",
        WeightGoal => "weight_goal",
        Milestone => "milestone",
    }
}

const ACHIEVEMENT_COLUMNS: &str = "id, user_id, kind, title, description, date";

#[derive(Debug, FromRow)]
pub struct AchievementRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub date: Date,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    #[serde(with = "iso_date")]
    pub date: Date,
}

impl TryFrom<AchievementRow> for Achievement {
    type Error = ValidationError;

    fn try_from(r: AchievementRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind.parse()?,
            title: r.title,
            description: r.description,
            date: r.date,
        })
    }
}

pub struct NewAchievement {
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub date: Date,
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Achievement>> {
    let rows = sqlx::query_as::<_, AchievementRow>(&format!(
        r#"
        SELECT {ACHIEVEMENT_COLUMNS}
        FROM achievements
        WHERE user_id = $1
        ORDER BY date DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list achievements")?;
    Ok(rows
        .into_iter()
        .map(Achievement::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn exists(
    db: &PgPool,
    user_id: Uuid,
    kind: AchievementKind,
    title: &str,
) -> anyhow::Result<bool> {
    let found: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM achievements WHERE user_id = $1 AND kind = $2 AND title = $3 LIMIT 1",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(title)
    .fetch_optional(db)
    .await
    .context("achievement exists")?;
    Ok(found.is_some())
}

pub async fn create(db: &PgPool, user_id: Uuid, a: &NewAchievement) -> anyhow::Result<Achievement> {
    let row = sqlx::query_as::<_, AchievementRow>(&format!(
        r#"
        INSERT INTO achievements (user_id, kind, title, description, date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ACHIEVEMENT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(a.kind.as_str())
    .bind(&a.title)
    .bind(&a.description)
    .bind(a.date)
    .fetch_one(db)
    .await
    .context("insert achievement")?;
    Ok(Achievement::try_from(row)?)
}

use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;

const WEIGHT_COLUMNS: &str = "id, user_id, weight, date, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Weight {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub weight: f64,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn create<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    weight: f64,
    date: Date,
) -> anyhow::Result<Weight> {
    let row = sqlx::query_as::<_, Weight>(&format!(
        r#"
        INSERT INTO weights (user_id, weight, date)
        VALUES ($1, $2, $3)
        RETURNING {WEIGHT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(weight)
    .bind(date)
    .fetch_one(db)
    .await
    .context("insert weight")?;
    Ok(row)
}

/// Newest first.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Weight>> {
    let rows = sqlx::query_as::<_, Weight>(&format!(
        r#"
        SELECT {WEIGHT_COLUMNS}
        FROM weights
        WHERE user_id = $1
        ORDER BY date DESC, created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list weights")?;
    Ok(rows)
}

pub async fn exists_on<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<bool> {
    let found: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM weights WHERE user_id = $1 AND date = $2 LIMIT 1")
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await
            .context("weight exists on date")?;
    Ok(found.is_some())
}

pub async fn delete(db: &PgPool, user_id: Uuid, weight_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM weights WHERE id = $1 AND user_id = $2")
        .bind(weight_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete weight")?;
    Ok(res.rows_affected() > 0)
}

/// Drops the whole history and, when given, starts over from one entry.
pub async fn reset(
    db: &PgPool,
    user_id: Uuid,
    start: Option<(f64, Date)>,
) -> anyhow::Result<Option<Weight>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let created = reset_tx(&mut tx, user_id, start).await?;
    tx.commit().await.context("commit tx")?;
    Ok(created)
}

pub async fn reset_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    start: Option<(f64, Date)>,
) -> anyhow::Result<Option<Weight>> {
    sqlx::query("DELETE FROM weights WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .context("delete weights")?;

    match start {
        Some((weight, date)) => Ok(Some(create(&mut **tx, user_id, weight, date).await?)),
        None => Ok(None),
    }
}

use anyhow::Context;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{NewWorkout, Workout, WorkoutRow};

const WORKOUT_COLUMNS: &str =
    "id, user_id, workout_type, duration, intensity, calories_burned, notes, date, created_at";

pub async fn create(db: &PgPool, user_id: Uuid, w: &NewWorkout) -> anyhow::Result<Workout> {
    let row = sqlx::query_as::<_, WorkoutRow>(&format!(
        r#"
        INSERT INTO workouts (user_id, workout_type, duration, intensity, calories_burned, notes, date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {WORKOUT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(w.workout_type.as_str())
    .bind(w.duration)
    .bind(w.intensity.as_str())
    .bind(w.calories_burned)
    .bind(&w.notes)
    .bind(w.date)
    .fetch_one(db)
    .await
    .context("insert workout")?;
    Ok(Workout::try_from(row)?)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    date: Option<Date>,
) -> anyhow::Result<Vec<Workout>> {
    let rows = sqlx::query_as::<_, WorkoutRow>(&format!(
        r#"
        SELECT {WORKOUT_COLUMNS}
        FROM workouts
        WHERE user_id = $1 AND ($2::date IS NULL OR date = $2)
        ORDER BY date DESC, created_at DESC
        "#
    ))
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await
    .context("list workouts")?;
    Ok(rows
        .into_iter()
        .map(Workout::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

pub async fn delete(db: &PgPool, user_id: Uuid, workout_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM workouts WHERE id = $1 AND user_id = $2")
        .bind(workout_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete workout")?;
    Ok(res.rows_affected() > 0)
}

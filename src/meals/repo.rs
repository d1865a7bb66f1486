use anyhow::Context;
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use super::repo_types::{
    MacroValues, Meal, MealRow, MealType, NewMeal, NewNutritionAnalysis, NutritionAnalysis,
    NutritionAnalysisRow,
};

const MEAL_COLUMNS: &str = "id, user_id, meal_type, description, calories, protein, carbs, fat, \
                            portion_size, photo_url, date, time, created_at";

const ANALYSIS_COLUMNS: &str = "id, meal_id, calories, protein, carbs, fiber, net_carbs, fat, \
                                keto_friendly, low_carb_friendly, food_items, analysis_date";

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct MealUpdate {
    pub meal_type: Option<MealType>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub portion_size: Option<String>,
    pub date: Option<Date>,
    pub time: Option<String>,
}

fn into_meals(rows: Vec<MealRow>) -> anyhow::Result<Vec<Meal>> {
    Ok(rows
        .into_iter()
        .map(Meal::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

async fn insert_meal_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    m: &NewMeal,
) -> anyhow::Result<Meal> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        INSERT INTO meals (user_id, meal_type, description, calories, protein, carbs, fat,
                           portion_size, photo_url, date, time)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(m.meal_type.as_str())
    .bind(&m.description)
    .bind(m.calories)
    .bind(m.protein)
    .bind(m.carbs)
    .bind(m.fat)
    .bind(&m.portion_size)
    .bind(&m.photo_url)
    .bind(m.date)
    .bind(&m.time)
    .fetch_one(&mut **tx)
    .await
    .context("insert meal")?;
    Ok(Meal::try_from(row)?)
}

pub async fn create(db: &PgPool, user_id: Uuid, m: &NewMeal) -> anyhow::Result<Meal> {
    let mut tx = db.begin().await.context("begin tx")?;
    let meal = insert_meal_tx(&mut tx, user_id, m).await?;
    tx.commit().await.context("commit tx")?;
    Ok(meal)
}

/// Stores a meal together with the analysis it came from.
pub async fn create_with_analysis(
    db: &PgPool,
    user_id: Uuid,
    m: &NewMeal,
    a: &NewNutritionAnalysis,
) -> anyhow::Result<(Meal, NutritionAnalysis)> {
    let mut tx = db.begin().await.context("begin tx")?;
    let meal = insert_meal_tx(&mut tx, user_id, m).await?;
    let analysis = sqlx::query_as::<_, NutritionAnalysisRow>(&format!(
        r#"
        INSERT INTO nutrition_analyses (meal_id, calories, protein, carbs, fiber, net_carbs, fat,
                                        keto_friendly, low_carb_friendly, food_items)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {ANALYSIS_COLUMNS}
        "#
    ))
    .bind(meal.id)
    .bind(a.calories)
    .bind(a.protein)
    .bind(a.carbs)
    .bind(a.fiber)
    .bind(a.net_carbs)
    .bind(a.fat)
    .bind(a.keto_friendly)
    .bind(a.low_carb_friendly)
    .bind(Json(&a.food_items))
    .fetch_one(&mut *tx)
    .await
    .context("insert nutrition analysis")?;
    tx.commit().await.context("commit tx")?;
    Ok((meal, analysis.into()))
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    date: Option<Date>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE user_id = $1 AND ($2::date IS NULL OR date = $2)
        ORDER BY date DESC, created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(user_id)
    .bind(date)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list meals")?;
    into_meals(rows)
}

/// Meals dated within `[from, to]`, oldest first.
pub async fn list_between(
    db: &PgPool,
    user_id: Uuid,
    from: Date,
    to: Date,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE user_id = $1 AND date BETWEEN $2 AND $3
        ORDER BY date ASC, created_at ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
    .context("list meals between dates")?;
    into_meals(rows)
}

pub async fn distinct_dates_since(
    db: &PgPool,
    user_id: Uuid,
    since: Date,
) -> anyhow::Result<Vec<Date>> {
    let rows: Vec<(Date,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT date
        FROM meals
        WHERE user_id = $1 AND date >= $2
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await
    .context("list meal dates")?;
    Ok(rows.into_iter().map(|(d,)| d).collect())
}

pub async fn get(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        SELECT {MEAL_COLUMNS}
        FROM meals
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get meal")?;
    Ok(row.map(Meal::try_from).transpose()?)
}

pub async fn exists(db: &PgPool, meal_id: Uuid) -> anyhow::Result<bool> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM meals WHERE id = $1")
        .bind(meal_id)
        .fetch_optional(db)
        .await
        .context("meal exists")?;
    Ok(found.is_some())
}

pub async fn get_analysis(db: &PgPool, meal_id: Uuid) -> anyhow::Result<Option<NutritionAnalysis>> {
    let row = sqlx::query_as::<_, NutritionAnalysisRow>(&format!(
        r#"
        SELECT {ANALYSIS_COLUMNS}
        FROM nutrition_analyses
        WHERE meal_id = $1
        "#
    ))
    .bind(meal_id)
    .fetch_optional(db)
    .await
    .context("get nutrition analysis")?;
    Ok(row.map(Into::into))
}

pub async fn analyses_for_meals(
    db: &PgPool,
    meal_ids: &[Uuid],
) -> anyhow::Result<Vec<NutritionAnalysis>> {
    if meal_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, NutritionAnalysisRow>(&format!(
        r#"
        SELECT {ANALYSIS_COLUMNS}
        FROM nutrition_analyses
        WHERE meal_id = ANY($1)
        "#
    ))
    .bind(meal_ids)
    .fetch_all(db)
    .await
    .context("list nutrition analyses")?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Most recent meal of the user that carries an LLM analysis.
pub async fn latest_analysed(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Meal>> {
    let row = sqlx::query_as::<_, MealRow>(
        r#"
        SELECT m.id, m.user_id, m.meal_type, m.description, m.calories, m.protein, m.carbs,
               m.fat, m.portion_size, m.photo_url, m.date, m.time, m.created_at
        FROM meals m
        JOIN nutrition_analyses a ON a.meal_id = m.id
        WHERE m.user_id = $1
        ORDER BY m.created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("latest analysed meal")?;
    Ok(row.map(Meal::try_from).transpose()?)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    u: &MealUpdate,
) -> anyhow::Result<Option<Meal>> {
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        UPDATE meals
           SET meal_type    = COALESCE($3, meal_type),
               description  = COALESCE($4, description),
               calories     = COALESCE($5, calories),
               protein      = COALESCE($6, protein),
               carbs        = COALESCE($7, carbs),
               fat          = COALESCE($8, fat),
               portion_size = COALESCE($9, portion_size),
               date         = COALESCE($10, date),
               time         = COALESCE($11, time)
         WHERE id = $1 AND user_id = $2
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(meal_id)
    .bind(user_id)
    .bind(u.meal_type.map(|t| t.as_str()))
    .bind(&u.description)
    .bind(u.calories)
    .bind(u.protein)
    .bind(u.carbs)
    .bind(u.fat)
    .bind(&u.portion_size)
    .bind(u.date)
    .bind(&u.time)
    .fetch_optional(db)
    .await
    .context("update meal")?;
    Ok(row.map(Meal::try_from).transpose()?)
}

/// Overwrites a meal's macros and keeps its analysis in step.
pub async fn update_macros(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
    v: MacroValues,
) -> anyhow::Result<Option<Meal>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let row = sqlx::query_as::<_, MealRow>(&format!(
        r#"
        UPDATE meals
           SET calories = $3, protein = $4, carbs = $5, fat = $6
         WHERE id = $1 AND user_id = $2
        RETURNING {MEAL_COLUMNS}
        "#
    ))
    .bind(meal_id)
    .bind(user_id)
    .bind(v.calories)
    .bind(v.protein)
    .bind(v.carbs)
    .bind(v.fat)
    .fetch_optional(&mut *tx)
    .await
    .context("update meal macros")?;

    let Some(row) = row else {
        return Ok(None);
    };

    sqlx::query(
        r#"
        UPDATE nutrition_analyses
           SET calories = $2, protein = $3, carbs = $4, fat = $5,
               net_carbs = GREATEST($4 - fiber, 0)
         WHERE meal_id = $1
        "#,
    )
    .bind(meal_id)
    .bind(v.calories)
    .bind(v.protein)
    .bind(v.carbs)
    .bind(v.fat)
    .execute(&mut *tx)
    .await
    .context("update analysis macros")?;

    tx.commit().await.context("commit tx")?;
    Ok(Some(Meal::try_from(row)?))
}

pub async fn delete(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
        .bind(meal_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal")?;
    Ok(res.rows_affected() > 0)
}

// ---- Likes ----

pub async fn like(db: &PgPool, meal_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meal_likes (meal_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (meal_id, user_id) DO NOTHING
        "#,
    )
    .bind(meal_id)
    .bind(user_id)
    .execute(db)
    .await
    .context("insert meal like")?;
    Ok(())
}

pub async fn unlike(db: &PgPool, meal_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM meal_likes WHERE meal_id = $1 AND user_id = $2")
        .bind(meal_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal like")?;
    Ok(res.rows_affected() > 0)
}

/// Like count per meal and whether `user_id` is among the likers.
pub async fn like_stats(
    db: &PgPool,
    user_id: Uuid,
    meal_ids: &[Uuid],
) -> anyhow::Result<Vec<(Uuid, i64, bool)>> {
    if meal_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, (Uuid, i64, bool)>(
        r#"
        SELECT meal_id, COUNT(*), BOOL_OR(user_id = $2)
        FROM meal_likes
        WHERE meal_id = ANY($1)
        GROUP BY meal_id
        "#,
    )
    .bind(meal_ids)
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("meal like stats")?;
    Ok(rows)
}

use anyhow::Context;
use sqlx::PgExecutor;
use uuid::Uuid;

use super::repo_types::{ProfileInput, ProfileRow, UserProfile, PROFILE_COLUMNS};
use crate::nutrition::formulas::{bmr, Targets};

pub async fn get<'e>(db: impl PgExecutor<'e>, user_id: Uuid) -> anyhow::Result<Option<UserProfile>> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get profile")?;
    Ok(row.map(UserProfile::try_from).transpose()?)
}

/// Inserts or replaces the single profile of `user_id`. `bmr` always holds
/// the formula value; a manual basal rate goes to `basal_calories`.
pub async fn upsert<'e>(
    db: impl PgExecutor<'e>,
    user_id: Uuid,
    input: &ProfileInput,
    targets: &Targets,
) -> anyhow::Result<UserProfile> {
    let formula_bmr = bmr(input.gender, input.starting_weight, input.height, input.age);
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        r#"
        INSERT INTO user_profiles (
            user_id, height, starting_weight, target_weight, age, gender, activity_level,
            workout_frequency, workout_type, weight_loss_rate, bmr, basal_calories, tdee,
            calories_target, protein_target, tdee_calculation_method, use_tdee_multiplier,
            include_workout_calories, completed_questionnaire, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, TRUE, now())
        ON CONFLICT (user_id) DO UPDATE SET
            height = EXCLUDED.height,
            starting_weight = EXCLUDED.starting_weight,
            target_weight = EXCLUDED.target_weight,
            age = EXCLUDED.age,
            gender = EXCLUDED.gender,
            activity_level = EXCLUDED.activity_level,
            workout_frequency = EXCLUDED.workout_frequency,
            workout_type = EXCLUDED.workout_type,
            weight_loss_rate = EXCLUDED.weight_loss_rate,
            bmr = EXCLUDED.bmr,
            basal_calories = EXCLUDED.basal_calories,
            tdee = EXCLUDED.tdee,
            calories_target = EXCLUDED.calories_target,
            protein_target = EXCLUDED.protein_target,
            tdee_calculation_method = EXCLUDED.tdee_calculation_method,
            use_tdee_multiplier = EXCLUDED.use_tdee_multiplier,
            include_workout_calories = EXCLUDED.include_workout_calories,
            completed_questionnaire = TRUE,
            updated_at = now()
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(input.height)
    .bind(input.starting_weight)
    .bind(input.target_weight)
    .bind(i32::try_from(input.age).context("age out of range")?)
    .bind(input.gender.as_str())
    .bind(input.activity_level.as_str())
    .bind(i32::try_from(input.workout_frequency).context("workout_frequency out of range")?)
    .bind(input.workout_type.as_str())
    .bind(input.weight_loss_rate.as_str())
    .bind(formula_bmr)
    .bind(input.basal_calories.filter(|b| *b > 0.0))
    .bind(targets.tdee)
    .bind(targets.calories_target)
    .bind(targets.protein_target)
    .bind(input.tdee_calculation_method.as_str())
    .bind(input.use_tdee_multiplier)
    .bind(input.include_workout_calories)
    .fetch_one(db)
    .await
    .context("upsert profile")?;
    Ok(UserProfile::try_from(row)?)
}

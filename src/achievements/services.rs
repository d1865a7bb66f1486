use sqlx::PgPool;
use time::{Date, Duration};
use tracing::info;
use uuid::Uuid;

use super::repo::{self, Achievement, AchievementKind, NewAchievement};
use crate::meals;
use crate::nutrition::streak::{
    current_streak, is_milestone, streak_description, streak_title, weight_goal_description,
    MAX_LOOKBACK_DAYS, WEIGHT_GOAL_TITLE,
};

/// Creates `a` unless the user already holds one with the same title.
pub async fn award_once(
    db: &PgPool,
    user_id: Uuid,
    a: NewAchievement,
) -> anyhow::Result<Option<Achievement>> {
    if repo::exists(db, user_id, a.kind, &a.title).await? {
        return Ok(None);
    }
    let created = repo::create(db, user_id, &a).await?;
    info!(%user_id, title = %created.title, "achievement awarded");
    Ok(Some(created))
}

/// Awards a streak achievement when today's logging streak sits on a
/// milestone.
pub async fn check_streak(
    db: &PgPool,
    user_id: Uuid,
    today: Date,
) -> anyhow::Result<Option<Achievement>> {
    let since = today.saturating_sub(Duration::days(i64::from(MAX_LOOKBACK_DAYS)));
    let dates = meals::repo::distinct_dates_since(db, user_id, since).await?;
    let streak = current_streak(&dates, today);
    if !is_milestone(streak) {
        return Ok(None);
    }
    award_once(
        db,
        user_id,
        NewAchievement {
            kind: AchievementKind::Streak,
            title: streak_title(streak),
            description: streak_description(streak),
            date: today,
        },
    )
    .await
}

pub async fn award_weight_goal(
    db: &PgPool,
    user_id: Uuid,
    target_kg: f64,
    date: Date,
) -> anyhow::Result<Option<Achievement>> {
    award_once(
        db,
        user_id,
        NewAchievement {
            kind: AchievementKind::WeightGoal,
            title: WEIGHT_GOAL_TITLE.to_string(),
            description: weight_goal_description(target_kg),
            date,
        },
    )
    .await
}

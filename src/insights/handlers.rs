use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    dates::{self, iso_date},
    error::{internal, ApiError},
    meals,
    nutrition::{
        daily::{summarize_day, DailySummary},
        insights::{range_insights, week_of, weekly_chart, InsightRange, Insights, RangeTargets, WeeklyChart},
    },
    profile,
    state::AppState,
    workouts,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/insights", get(insights))
        .route("/insights/weekly", get(weekly))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    #[serde(default = "default_range")]
    pub range: InsightRange,
}

fn default_range() -> InsightRange {
    InsightRange::Week
}

fn anchor(state: &AppState, date: Option<Date>) -> Date {
    date.unwrap_or_else(|| dates::today(state.config.utc_offset_hours))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<DailySummary>, ApiError> {
    let date = anchor(&state, q.date);
    let profile = profile::repo::get(&state.db, user.id)
        .await
        .map_err(internal)?;
    let meals = meals::repo::list_between(&state.db, user.id, date, date)
        .await
        .map_err(internal)?;
    let workouts = workouts::repo::list_by_user(&state.db, user.id, Some(date))
        .await
        .map_err(internal)?;
    let plan = profile.as_ref().map(|p| p.energy_plan());
    Ok(Json(summarize_day(plan.as_ref(), date, meals, &workouts)))
}

#[instrument(skip(state))]
pub async fn insights(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<InsightsQuery>,
) -> Result<Json<Insights>, ApiError> {
    let date = anchor(&state, q.date);
    let (from, to) = q.range.bounds(date);
    let meals = meals::repo::list_between(&state.db, user.id, from, to)
        .await
        .map_err(internal)?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let fiber: HashMap<Uuid, f64> = meals::repo::analyses_for_meals(&state.db, &ids)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|a| (a.meal_id, a.fiber))
        .collect();
    let targets = profile::repo::get(&state.db, user.id)
        .await
        .map_err(internal)?
        .map(|p| RangeTargets {
            calories: p.calories_target,
            protein: p.protein_target,
        });
    Ok(Json(range_insights(q.range, date, meals, &fiber, targets)))
}

#[instrument(skip(state))]
pub async fn weekly(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<DateQuery>,
) -> Result<Json<WeeklyChart>, ApiError> {
    let date = anchor(&state, q.date);
    let (from, to) = week_of(date);
    let meals = meals::repo::list_between(&state.db, user.id, from, to)
        .await
        .map_err(internal)?;
    let target = profile::repo::get(&state.db, user.id)
        .await
        .map_err(internal)?
        .map(|p| p.calories_target);
    Ok(Json(weekly_chart(date, &meals, target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn parse(uri: &str) -> Result<InsightsQuery, axum::extract::rejection::QueryRejection> {
        let uri: axum::http::Uri = uri.parse().unwrap();
        Query::<InsightsQuery>::try_from_uri(&uri).map(|Query(q)| q)
    }

    #[test]
    fn range_defaults_to_week() {
        let q = parse("/insights?date=2025-03-10").unwrap();
        assert_eq!(q.range, InsightRange::Week);
        assert_eq!(q.date, Some(date!(2025 - 03 - 10)));

        let q = parse("/insights?range=month").unwrap();
        assert_eq!(q.range, InsightRange::Month);
        assert!(q.date.is_none());
    }

    #[test]
    fn unknown_range_is_rejected() {
        assert!(parse("/insights?range=year").is_err());
    }
}

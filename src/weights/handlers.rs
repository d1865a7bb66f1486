use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::Date;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo::{self, Weight};
use crate::{
    achievements::{repo::Achievement, services as achievements},
    auth::AuthUser,
    dates::{self, iso_date},
    error::{internal, not_found, ApiError, ValidationError},
    nutrition::streak::reached_weight_goal,
    profile,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/weights", get(list_weights).post(add_weight))
        .route("/weights/:id", delete(delete_weight))
        .route("/weights/reset", post(reset_weights))
}

#[derive(Debug, Deserialize)]
pub struct AddWeightRequest {
    pub weight: f64,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

impl AddWeightRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(self.weight > 0.0) {
            return Err(ValidationError::NotPositive { field: "weight" });
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AddWeightResponse {
    pub weight: Weight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<Achievement>,
}

#[instrument(skip(state))]
pub async fn list_weights(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Weight>>, ApiError> {
    let items = repo::list_by_user(&state.db, user.id)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state, body))]
pub async fn add_weight(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<AddWeightRequest>,
) -> Result<(StatusCode, Json<AddWeightResponse>), ApiError> {
    body.validate()?;
    let date = body
        .date
        .unwrap_or_else(|| dates::today(state.config.utc_offset_hours));
    let weight = repo::create(&state.db, user.id, body.weight, date)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, weight = weight.weight, "weight logged");

    // A failed achievement check never loses the logged weight.
    let achievement = match check_weight_goal(&state.db, user.id, &weight).await {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "weight goal check failed");
            None
        }
    };
    Ok((
        StatusCode::CREATED,
        Json(AddWeightResponse {
            weight,
            achievement,
        }),
    ))
}

async fn check_weight_goal(
    db: &PgPool,
    user_id: Uuid,
    weight: &Weight,
) -> anyhow::Result<Option<Achievement>> {
    let Some(profile) = profile::repo::get(db, user_id).await? else {
        return Ok(None);
    };
    if !reached_weight_goal(profile.starting_weight, profile.target_weight, weight.weight) {
        return Ok(None);
    }
    achievements::award_weight_goal(db, user_id, profile.target_weight, weight.date).await
}

#[instrument(skip(state))]
pub async fn delete_weight(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = repo::delete(&state.db, user.id, id)
        .await
        .map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Weight"))
    }
}

/// Wipes the history and starts over from the profile's starting weight.
#[instrument(skip(state))]
pub async fn reset_weights(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Weight>>, ApiError> {
    let profile = profile::repo::get(&state.db, user.id)
        .await
        .map_err(internal)?;
    let today = dates::today(state.config.utc_offset_hours);
    let start = profile.map(|p| (p.starting_weight, today));
    let created = repo::reset(&state.db, user.id, start)
        .await
        .map_err(internal)?;
    info!(user_id = %user.id, "weight history reset");
    Ok(Json(created.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn date_is_optional() {
        let body: AddWeightRequest = serde_json::from_str(r#"{"weight": 82.4}"#).unwrap();
        assert!(body.date.is_none());
        assert!(body.validate().is_ok());

        let body: AddWeightRequest =
            serde_json::from_str(r#"{"weight": 82.4, "date": "2025-03-01"}"#).unwrap();
        assert_eq!(body.date, Some(date!(2025 - 03 - 01)));
    }

    #[test]
    fn rejects_non_positive_weight() {
        let body: AddWeightRequest = serde_json::from_str(r#"{"weight": 0}"#).unwrap();
        assert_eq!(
            body.validate(),
            Err(ValidationError::NotPositive { field: "weight" })
        );
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateWorkoutRequest, EstimateQuery, EstimateResponse, WorkoutQuery};
use super::repo;
use super::repo_types::{NewWorkout, Workout};
use crate::{
    auth::AuthUser,
    dates,
    error::{internal, not_found, ApiError, ValidationError},
    nutrition::workouts::{estimate_calories_burned, resolve_calories_burned},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/estimate", get(estimate))
        .route("/workouts/:id", delete(delete_workout))
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<WorkoutQuery>,
) -> Result<Json<Vec<Workout>>, ApiError> {
    let items = repo::list_by_user(&state.db, user.id, q.date)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[instrument(skip(state, body))]
pub async fn create_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
    let new = new_workout(body, dates::today(state.config.utc_offset_hours))?;
    let workout = repo::create(&state.db, user.id, &new)
        .await
        .map_err(internal)?;
    info!(
        user_id = %user.id,
        kind = %workout.workout_type,
        calories = workout.calories_burned,
        "workout logged"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

fn new_workout(body: CreateWorkoutRequest, today: time::Date) -> Result<NewWorkout, ValidationError> {
    let duration = u32::try_from(body.duration)
        .ok()
        .filter(|d| *d > 0)
        .ok_or(ValidationError::NotPositive { field: "duration" })?;
    Ok(NewWorkout {
        workout_type: body.workout_type,
        duration: body.duration,
        intensity: body.intensity,
        calories_burned: resolve_calories_burned(
            body.calories_burned,
            body.workout_type,
            body.intensity,
            duration,
        ),
        notes: body.notes.filter(|n| !n.trim().is_empty()),
        date: body.date.unwrap_or(today),
    })
}

#[instrument(skip(_user))]
pub async fn estimate(
    _user: AuthUser,
    Query(q): Query<EstimateQuery>,
) -> Json<EstimateResponse> {
    Json(EstimateResponse {
        calories_burned: estimate_calories_burned(q.workout_type, q.intensity, q.duration),
    })
}

#[instrument(skip(state))]
pub async fn delete_workout(
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
        Err(not_found("Workout"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::token_for;
    use crate::nutrition::workouts::{Intensity, WorkoutType};
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use time::macros::date;
    use tower::ServiceExt;

    fn request(json: &str) -> CreateWorkoutRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn estimates_when_calories_missing() {
        let w = new_workout(
            request(r#"{"type": "cardio", "duration": 30}"#),
            date!(2025 - 03 - 10),
        )
        .unwrap();
        assert_eq!(w.intensity, Intensity::Medium);
        assert_eq!(w.calories_burned, 210);
        assert_eq!(w.date, date!(2025 - 03 - 10));
    }

    #[test]
    fn keeps_entered_calories() {
        let w = new_workout(
            request(r#"{"type": "hiit", "duration": 20, "intensity": "high", "calories_burned": 250, "date": "2025-03-01"}"#),
            date!(2025 - 03 - 10),
        )
        .unwrap();
        assert_eq!(w.workout_type, WorkoutType::Hiit);
        assert_eq!(w.calories_burned, 250);
        assert_eq!(w.date, date!(2025 - 03 - 01));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = new_workout(
            request(r#"{"type": "other", "duration": 0}"#),
            date!(2025 - 03 - 10),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NotPositive { field: "duration" });
    }

    #[tokio::test]
    async fn estimate_endpoint() {
        let state = AppState::fake();
        let token = token_for(&state.config.jwt, Uuid::new_v4(), 300);
        let res = routes()
            .with_state(state)
            .oneshot(
                Request::get("/workouts/estimate?type=strength&intensity=high&duration=45")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["calories_burned"], 360);
    }
}

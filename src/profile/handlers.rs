use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::repo;
use super::repo_types::{ProfileInput, UserProfile};
use crate::{
    auth::AuthUser,
    dates,
    error::{internal, not_found, ApiError},
    nutrition::formulas::{compute_targets, Targets},
    state::AppState,
    users::{self, repo::UserUpdate},
    weights,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(save_profile))
        .route("/profile/targets", post(preview_targets))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    repo::get(&state.db, user.id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Profile"))
}

/// What else a profile save changes besides the profile row.
#[derive(Debug, PartialEq)]
enum FollowUp {
    /// First save: finish onboarding and restart the weight history.
    Onboard,
    /// The starting weight changed: record it for today unless a weight
    /// was already logged.
    RecordStartingWeight,
    Nothing,
}

fn follow_up(previous_starting_weight: Option<f64>, starting_weight: f64) -> FollowUp {
    match previous_starting_weight {
        None => FollowUp::Onboard,
        Some(prev) if prev != starting_weight => FollowUp::RecordStartingWeight,
        Some(_) => FollowUp::Nothing,
    }
}

/// Saves the questionnaire (first time) or the profile editor (afterwards).
/// The profile and its follow-up writes commit together.
#[instrument(skip(state, body))]
pub async fn save_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ProfileInput>,
) -> Result<Json<UserProfile>, ApiError> {
    body.validate()?;
    let targets = compute_targets(&body.target_inputs());
    let today = dates::today(state.config.utc_offset_hours);

    let mut tx = state.db.begin().await.map_err(internal)?;
    users::repo::upsert(&mut *tx, user.id, user.email.as_deref())
        .await
        .map_err(internal)?;
    let previous = repo::get(&mut *tx, user.id).await.map_err(internal)?;
    let profile = repo::upsert(&mut *tx, user.id, &body, &targets)
        .await
        .map_err(internal)?;

    let next = follow_up(
        previous.map(|p| p.starting_weight),
        profile.starting_weight,
    );
    match next {
        FollowUp::Onboard => {
            let update = UserUpdate {
                display_name: body.display_name.clone().filter(|n| !n.trim().is_empty()),
                completed_onboarding: Some(true),
                ..Default::default()
            };
            users::repo::update(&mut *tx, user.id, &update)
                .await
                .map_err(internal)?;
            weights::repo::reset_tx(&mut tx, user.id, Some((profile.starting_weight, today)))
                .await
                .map_err(internal)?;
        }
        FollowUp::RecordStartingWeight => {
            let logged_today = weights::repo::exists_on(&mut *tx, user.id, today)
                .await
                .map_err(internal)?;
            if !logged_today {
                weights::repo::create(&mut *tx, user.id, profile.starting_weight, today)
                    .await
                    .map_err(internal)?;
            }
        }
        FollowUp::Nothing => {}
    }
    tx.commit().await.map_err(internal)?;

    if next == FollowUp::Onboard {
        info!(user_id = %user.id, calories_target = profile.calories_target, "questionnaire completed");
    }
    Ok(Json(profile))
}

#[instrument(skip(body))]
pub async fn preview_targets(
    _user: AuthUser,
    Json(body): Json<ProfileInput>,
) -> Result<Json<Targets>, ApiError> {
    body.validate()?;
    Ok(Json(compute_targets(&body.target_inputs())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::token_for;
    use crate::error::ValidationError;
    use crate::nutrition::formulas::{Gender, TdeeMethod};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn questionnaire() -> serde_json::Value {
        serde_json::json!({
            "height": 180.0,
            "starting_weight": 90.0,
            "target_weight": 80.0,
            "age": 30,
            "gender": "male",
            "activity_level": "moderate",
            "workout_type": "mixed",
            "weight_loss_rate": "moderate"
        })
    }

    #[test]
    fn input_defaults() {
        let input: ProfileInput = serde_json::from_value(questionnaire()).unwrap();
        assert_eq!(input.gender, Gender::Male);
        assert_eq!(input.workout_frequency, 0);
        assert_eq!(input.tdee_calculation_method, TdeeMethod::FullActivity);
        assert!(input.use_tdee_multiplier);
        assert!(input.include_workout_calories);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_measurements() {
        let mut raw = questionnaire();
        raw["height"] = serde_json::json!(0);
        let input: ProfileInput = serde_json::from_value(raw).unwrap();
        assert_eq!(
            input.validate(),
            Err(ValidationError::NotPositive { field: "height" })
        );
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut raw = questionnaire();
        raw["basal_calories"] = serde_json::json!(0);
        raw["calories_target"] = serde_json::json!(1800);
        let input: ProfileInput = serde_json::from_value(raw).unwrap();
        let t = compute_targets(&input.target_inputs());
        assert_eq!(t.bmr, 1880.0);
        assert_eq!(t.calories_target, 1800);
        assert_eq!(t.protein_target, 144);
    }

    #[test]
    fn follow_up_after_save() {
        assert_eq!(follow_up(None, 90.0), FollowUp::Onboard);
        assert_eq!(follow_up(Some(92.0), 90.0), FollowUp::RecordStartingWeight);
        assert_eq!(follow_up(Some(90.0), 90.0), FollowUp::Nothing);
    }

    #[tokio::test]
    async fn preview_returns_computed_targets() {
        let state = AppState::fake();
        let token = token_for(&state.config.jwt, Uuid::new_v4(), 3600);
        let app = routes().with_state(state);
        let res = app
            .oneshot(
                Request::post("/profile/targets")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(questionnaire().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let t: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(t["calories_target"], 2414);
        assert_eq!(t["deficit"], 500);
    }

    #[tokio::test]
    async fn preview_requires_a_token() {
        let app = routes().with_state(AppState::fake());
        let res = app
            .oneshot(
                Request::post("/profile/targets")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(questionnaire().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

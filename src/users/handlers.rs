use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use tracing::instrument;

use super::repo::{self, UserAccount, UserUpdate};
use crate::{
    auth::AuthUser,
    error::{internal, not_found, ApiError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me).patch(update_me))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub completed_onboarding: Option<bool>,
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserAccount>, ApiError> {
    let account = repo::upsert(&state.db, user.id, user.email.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(account))
}

#[instrument(skip(state, body))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateMeRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    repo::upsert(&state.db, user.id, user.email.as_deref())
        .await
        .map_err(internal)?;
    let update = UserUpdate {
        display_name: body.display_name,
        profile_picture: body.profile_picture,
        completed_onboarding: body.completed_onboarding,
    };
    repo::update(&state.db, user.id, &update)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("User"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn account(display_name: Option<&str>, email: Option<&str>) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            email: email.map(Into::into),
            display_name: display_name.map(Into::into),
            profile_picture: None,
            completed_onboarding: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn account_serialization() {
        let json = serde_json::to_string(&account(Some("דנה"), Some("dana@example.com"))).unwrap();
        assert!(json.contains("dana@example.com"));
        assert!(json.contains("\"completed_onboarding\":false"));
    }

    #[test]
    fn greeting_prefers_display_name() {
        assert_eq!(account(Some("דנה"), Some("d@x.com")).greeting_name(), "דנה");
        assert_eq!(account(None, Some("d@x.com")).greeting_name(), "d@x.com");
        assert_eq!(account(None, None).greeting_name(), "");
    }

    #[test]
    fn partial_update_body() {
        let body: UpdateMeRequest =
            serde_json::from_str(r#"{"completed_onboarding": true}"#).unwrap();
        assert_eq!(body.completed_onboarding, Some(true));
        assert!(body.display_name.is_none());
    }
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Verification half of the identity provider's token setup. Tokens are
/// minted elsewhere; this service only checks them.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;

    pub(crate) fn token_for(cfg: &JwtConfig, user_id: Uuid, ttl_secs: i64) -> String {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now as usize,
            exp: (now + ttl_secs) as usize,
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
            email: Some("dana@example.com".into()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.secret.as_bytes()),
        )
        .expect("sign token")
    }

    fn cfg(secret: &str, issuer: &str, audience: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    #[test]
    fn verifies_token_from_identity_provider() {
        let cfg = cfg("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = token_for(&cfg, user_id, 300);
        let claims = JwtKeys::from(&cfg).verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.email.as_deref(), Some("dana@example.com"));
    }

    #[test]
    fn rejects_expired_token() {
        let cfg = cfg("dev-secret", "iss", "aud");
        let token = token_for(&cfg, Uuid::new_v4(), -3600);
        assert!(JwtKeys::from(&cfg).verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_issuer_or_audience() {
        let good = cfg("same-secret", "good-iss", "good-aud");
        let bad = cfg("same-secret", "bad-iss", "bad-aud");
        let token = token_for(&good, Uuid::new_v4(), 300);
        assert!(JwtKeys::from(&bad).verify(&token).is_err());
    }

    #[tokio::test]
    async fn extractor_reads_bearer_header() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        let token = token_for(&state.config.jwt, user_id, 300);
        let (mut parts, _) = Request::builder()
            .header("authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        let user = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("authorized");
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn extractor_rejects_missing_header() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }
}

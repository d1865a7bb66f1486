use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

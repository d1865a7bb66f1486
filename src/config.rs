use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// When set, uploaded objects are addressed as `{public_url}/{key}`
    /// instead of through a presigned link.
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    Hosted,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub hosted_url: Option<String>,
    pub hosted_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    /// Offset applied to UTC when a request needs the user's wall clock
    /// (today's date, meal type by hour).
    pub utc_offset_hours: i8,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "dietbot".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "dietbot-users".into()),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT")?,
            bucket: std::env::var("MINIO_BUCKET").unwrap_or_else(|_| "dietbot".into()),
            access_key: std::env::var("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY")?,
            region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
            public_url: std::env::var("STORAGE_PUBLIC_URL").ok(),
        };
        let llm = LlmConfig {
            provider: match std::env::var("LLM_PROVIDER").as_deref() {
                Ok("openai") => LlmProviderKind::OpenAi,
                _ => LlmProviderKind::Hosted,
            },
            hosted_url: std::env::var("HOSTED_LLM_URL").ok(),
            hosted_api_key: std::env::var("HOSTED_LLM_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
        };
        let utc_offset_hours = std::env::var("APP_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse::<i8>().ok())
            .unwrap_or(0);
        Ok(Self {
            database_url,
            jwt,
            storage,
            llm,
            utc_offset_hours,
        })
    }
}

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub base_url: String,
    /// Cheaper model used for lookups and extraction.
    pub fast_model: String,
    /// Model used for plan generation, re-rolls, modifications and open questions.
    pub smart_model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub claude: ClaudeConfig,
    pub spoonacular_api_key: Option<String>,
    pub session_backend: SessionBackend,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealcraft".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "mealcraft-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let claude = ClaudeConfig {
            api_key: std::env::var("ANTHROPIC_API_KEY")?,
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1".into()),
            fast_model: std::env::var("CLAUDE_MODEL_FAST")
                .unwrap_or_else(|_| "claude-3-5-haiku-20241022".into()),
            smart_model: std::env::var("CLAUDE_MODEL_SMART")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };
        let spoonacular_api_key = std::env::var("SPOONACULAR_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let session_backend = match std::env::var("SESSION_STORE").as_deref() {
            Ok("memory") => SessionBackend::Memory,
            Ok("postgres") | Err(_) => SessionBackend::Postgres,
            Ok(other) => anyhow::bail!("unknown SESSION_STORE {other:?}"),
        };
        Ok(Self {
            database_url,
            jwt,
            claude,
            spoonacular_api_key,
            session_backend,
        })
    }
}

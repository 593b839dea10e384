use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::AuthConfig;

const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 8;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let secret =
            std::env::var("AUTH_SECRET_BASE64").context("AUTH_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(secret.trim())
            .context("invalid AUTH_SECRET_BASE64")?;
        let ttl = match std::env::var("ACCESS_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| anyhow!("ACCESS_TOKEN_TTL_MINUTES must be a positive integer"))?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };
        let auth = AuthConfig::new(secret_bytes, ttl).context("AUTH_SECRET_BASE64")?;

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect::<Vec<_>>();

        Ok(Self {
            auth,
            cors_allowed_origins,
        })
    }
}

/// Bootstrap admin credentials for `seed`.
#[derive(Clone)]
pub struct SeedConfig {
    pub email: String,
    pub password: String,
}

impl SeedConfig {
    pub fn load() -> Result<Self> {
        Ok(Self {
            email: env_required("FIRST_SUPERUSER")?,
            password: env_required("FIRST_SUPERUSER_PASSWORD")?,
        })
    }
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing env {}", key))
}

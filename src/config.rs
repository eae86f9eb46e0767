use serde::Deserialize;

/// Upper bound for token lifetimes (one year).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Parses a lifetime in minutes, clamped to `1..=MAX_TTL_MINUTES`.
fn ttl_from(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
        .clamp(1, MAX_TTL_MINUTES)
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    /// Adds the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "calculator".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "calculator-users".into()),
            ttl_minutes: ttl_from(std::env::var("JWT_TTL_MINUTES").ok().as_deref(), 60),
            refresh_ttl_minutes: ttl_from(
                std::env::var("JWT_REFRESH_TTL_MINUTES").ok().as_deref(),
                60 * 24 * 14,
            ),
        };
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 8001,
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_url,
            jwt,
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Configuration for tests and local runs without an environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            cookie_secure: false,
        }
    }
}

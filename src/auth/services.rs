pub(crate) use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::auth::dto::{LoginRequest, RegisterRequest};
use crate::auth::repo_types::{NewUser, User};
use crate::config::{AppConfig, JwtConfig, MAX_TTL_MINUTES};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{Store, StoreError};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "access_token";
const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

fn ttl_duration(minutes: i64) -> Duration {
    Duration::from_secs(minutes.clamp(0, MAX_TTL_MINUTES) as u64 * 60)
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = cfg.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: ttl_duration(ttl_minutes),
            refresh_ttl: ttl_duration(refresh_ttl_minutes),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now
            .checked_add(TimeDuration::seconds(ttl.as_secs() as i64))
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Access {
            anyhow::bail!("not an access token");
        }
        Ok(claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// Session cookie carrying the access token.
pub fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(TimeDuration::minutes(config.jwt.ttl_minutes.clamp(0, MAX_TTL_MINUTES)))
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

fn required(value: &str, label: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{label} is required")));
    }
    Ok(())
}

/// Trims and checks a registration payload, returning it normalized.
pub fn validate_registration(req: &RegisterRequest) -> AppResult<RegisterRequest> {
    let normalized = RegisterRequest {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        username: req.username.trim().to_string(),
        password: req.password.clone(),
        confirm_password: req.confirm_password.clone(),
    };

    required(&normalized.first_name, "First name")?;
    required(&normalized.last_name, "Last name")?;
    required(&normalized.email, "Email")?;
    required(&normalized.username, "Username")?;
    required(&normalized.password, "Password")?;
    required(&normalized.confirm_password, "Password confirmation")?;

    if normalized.password != normalized.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }
    Ok(normalized)
}

pub async fn register_user(store: &dyn Store, req: &RegisterRequest) -> AppResult<User> {
    let valid = match validate_registration(req) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "registration rejected");
            return Err(e);
        }
    };

    let password_hash = hash_password(&valid.password)?;
    let new = NewUser {
        username: valid.username,
        email: valid.email,
        password_hash,
        first_name: valid.first_name,
        last_name: valid.last_name,
    };

    match store.create_user(new).await {
        Ok(user) => Ok(user),
        Err(StoreError::Duplicate(field)) => {
            warn!(%field, "registration duplicate");
            Err(AppError::Conflict(StoreError::Duplicate(field).to_string()))
        }
        Err(StoreError::Other(e)) => Err(AppError::Internal(e)),
    }
}

pub async fn authenticate(store: &dyn Store, req: &LoginRequest) -> AppResult<User> {
    let login = req.username.trim();
    if login.is_empty() || req.password.is_empty() {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let Some(user) = store.find_user_by_login(login).await? else {
        warn!(login = %login, "login unknown user");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }
    Ok(user)
}

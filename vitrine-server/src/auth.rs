//! Admin authentication and session handling.
//!
//! Sign-in checks credentials against the admin registry collection and
//! only succeeds when the matching registry document carries
//! `isAdmin: true` — a valid password without that flag is an
//! authorization failure (403), distinct from an authentication failure
//! (401). Successful sign-in mints a short-lived HS256 session token;
//! editing routes require it via the [`RequireAdmin`] extractor.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use vitrine_core::models::AdminRecord;
use vitrine_store::{collections, DocumentStore, StoreError};

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin registry document id
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Expiry (Unix timestamp)
    pub exp: u64,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing authorization token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    Expired,

    #[error("invalid email or password")]
    BadCredentials,

    #[error("account is not an administrator")]
    NotAdmin,

    #[error("admin sign-in is not configured")]
    Disabled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::Expired
            | AuthError::BadCredentials => StatusCode::UNAUTHORIZED,
            AuthError::NotAdmin => StatusCode::FORBIDDEN,
            AuthError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = axum::Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Shared via request extensions, like the rest of the app state.
#[derive(Clone)]
pub struct AuthState {
    keys: Option<Arc<SessionKeys>>,
    ttl_secs: u64,
    leeway_secs: u64,
}

impl AuthState {
    pub fn new(secret: Option<&str>, ttl_secs: u64) -> Self {
        let keys = secret.map(|secret| {
            Arc::new(SessionKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            })
        });
        Self {
            keys,
            ttl_secs,
            leeway_secs: 60,
        }
    }

    pub fn enabled(&self) -> bool {
        self.keys.is_some()
    }

    pub fn mint(&self, sub: &str, email: &str, name: &str) -> Result<String, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::Disabled)?;
        let exp = chrono::Utc::now().timestamp().max(0) as u64 + self.ttl_secs;
        let claims = AdminClaims {
            sub: sub.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::Disabled)?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        validation.validate_aud = false;

        let data = decode::<AdminClaims>(token, &keys.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}

/// Authenticate against the admin registry and mint a session token.
pub async fn sign_in(
    store: &dyn DocumentStore,
    auth: &AuthState,
    email: &str,
    password: &str,
) -> Result<String, AuthError> {
    if !auth.enabled() {
        return Err(AuthError::Disabled);
    }

    let registry = store.list(collections::ADMINS).await?;
    let mut found: Option<(String, AdminRecord)> = None;
    for (id, value) in registry {
        if let Ok(record) = serde_json::from_value::<AdminRecord>(value) {
            if record.email.eq_ignore_ascii_case(email) {
                found = Some((id, record));
                break;
            }
        }
    }
    let Some((id, record)) = found else {
        return Err(AuthError::BadCredentials);
    };

    let parsed = PasswordHash::new(&record.password_hash).map_err(|e| {
        warn!(%id, "malformed password hash in admin registry: {e}");
        AuthError::BadCredentials
    })?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AuthError::BadCredentials);
    }

    // Authenticated, but only registry entries flagged as admin are
    // authorized to edit.
    if !record.is_admin {
        return Err(AuthError::NotAdmin);
    }

    auth.mint(&id, &record.email, &record.name)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Write (or overwrite) an admin registry entry. Used for startup
/// seeding and test fixtures.
pub async fn seed_admin(
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
    name: &str,
) -> Result<(), AuthError> {
    let record = AdminRecord {
        email: email.to_string(),
        name: name.to_string(),
        password_hash: hash_password(password)?,
        is_admin: true,
    };
    let value = serde_json::to_value(&record).map_err(StoreError::from)?;
    store
        .put(collections::ADMINS, &admin_doc_id(email), value)
        .await?;
    Ok(())
}

/// Registry document ids come from the email, restricted to the store's
/// name alphabet.
fn admin_doc_id(email: &str) -> String {
    email
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Optional session: pages render read-only without one.
#[derive(Debug, Clone)]
pub struct MaybeAdmin(pub Option<AdminClaims>);

/// Required session: editing routes reject without a valid one.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminClaims);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl<S> FromRequestParts<S> for MaybeAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts.extensions.get::<AuthState>().cloned() else {
            return Ok(MaybeAdmin(None));
        };
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeAdmin(None));
        };
        match auth.verify(token) {
            Ok(claims) => Ok(MaybeAdmin(Some(claims))),
            Err(err) => {
                warn!("session rejected: {err}");
                Err(err)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthState>()
            .cloned()
            .ok_or(AuthError::Disabled)?;
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        Ok(RequireAdmin(auth.verify(token)?))
    }
}

//! Account sign-up, sign-in and cookie sessions backed by local storage.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{Session, UserSummary},
    error::{ApiError, ErrorCode},
    protocol::{SignInForm, SignUpForm},
};
use storage::{NewUser, Storage};
use thiserror::Error;
use tracing::{info, warn};

mod password;
mod token;

pub use password::{hash_password, new_salt, verify_password};
pub use token::{mint_session_token, verify_session_token, SessionClaims};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const SESSION_COOKIE: &str = "session";
pub const SIGN_UP_SUCCESS: &str = "Account created successfully! Please sign in to continue.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("An account with this email already exists.")]
    EmailTaken,
    #[error("session is missing or expired")]
    InvalidSession,
    #[error("{0}")]
    Validation(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<&AuthError> for ApiError {
    fn from(value: &AuthError) -> Self {
        let code = match value {
            AuthError::InvalidCredentials | AuthError::InvalidSession | AuthError::Token(_) => {
                ErrorCode::Unauthorized
            }
            AuthError::EmailTaken => ErrorCode::Conflict,
            AuthError::Validation(_) => ErrorCode::Validation,
            AuthError::Storage(_) => ErrorCode::Internal,
        };
        let message = match value {
            AuthError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        ApiError::new(code, message)
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub session: Session,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, form: &SignUpForm) -> Result<UserSummary, AuthError>;
    async fn sign_in(&self, form: &SignInForm) -> Result<SignedIn, AuthError>;
    async fn get_session(&self, token: &str) -> Result<Session, AuthError>;
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}

/// Checks a sign-up form before anything touches storage.
pub fn validate_sign_up(form: &SignUpForm) -> Result<(), AuthError> {
    let required = [
        &form.first_name,
        &form.last_name,
        &form.email,
        &form.password,
        &form.confirm_password,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(AuthError::Validation("All fields are required.".into()));
    }
    if !form.email.contains('@') {
        return Err(AuthError::Validation(
            "Please enter a valid email address.".into(),
        ));
    }
    if form.password != form.confirm_password {
        return Err(AuthError::Validation("Passwords do not match.".into()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Finds the session token in a `Cookie` header value.
pub fn session_token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

#[derive(Clone)]
pub struct LocalAuthProvider {
    storage: Storage,
    config: AuthConfig,
}

impl LocalAuthProvider {
    pub fn new(storage: Storage, config: AuthConfig) -> Self {
        Self { storage, config }
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_up(&self, form: &SignUpForm) -> Result<UserSummary, AuthError> {
        validate_sign_up(form)?;
        let email = normalize_email(&form.email);
        let salt = new_salt();
        let hash = hash_password(&salt, &form.password);

        let user_id = self
            .storage
            .create_user(&NewUser {
                email: &email,
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                password_hash: &hash,
                password_salt: &salt,
            })
            .await?
            .ok_or(AuthError::EmailTaken)?;

        info!(user_id = user_id.0, %email, "account created");
        Ok(UserSummary {
            user_id,
            email,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        })
    }

    async fn sign_in(&self, form: &SignInForm) -> Result<SignedIn, AuthError> {
        let email = normalize_email(&form.email);
        let Some(user) = self.storage.user_by_email(&email).await? else {
            warn!(%email, "sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&user.password_salt, &form.password, &user.password_hash) {
            warn!(%email, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.config.session_ttl_seconds);
        self.storage
            .create_session(&session_id, user.user_id, expires_at)
            .await?;
        let token = mint_session_token(
            &self.config.session_secret,
            user.user_id,
            &session_id,
            &user.email,
            now,
            expires_at,
        )?;

        info!(user_id = user.user_id.0, %email, "signed in");
        Ok(SignedIn {
            token,
            session: Session {
                session_id,
                user: user.summary(),
            },
            expires_at,
        })
    }

    async fn get_session(&self, token: &str) -> Result<Session, AuthError> {
        let claims = verify_session_token(&self.config.session_secret, token)?;
        let Some(stored) = self.storage.load_session(&claims.sid).await? else {
            return Err(AuthError::InvalidSession);
        };
        if stored.expires_at <= Utc::now() {
            self.storage.delete_session(&stored.session_id).await?;
            return Err(AuthError::InvalidSession);
        }
        if claims.user_id() != Some(stored.user_id) {
            warn!(sid = %claims.sid, "session token subject does not match session owner");
            return Err(AuthError::InvalidSession);
        }
        let user = self
            .storage
            .user_by_id(stored.user_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        Ok(Session {
            session_id: stored.session_id,
            user: user.summary(),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let claims = verify_session_token(&self.config.session_secret, token)?;
        let removed = self.storage.delete_session(&claims.sid).await?;
        info!(sid = %claims.sid, removed, "signed out");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

//! Sign-up, sign-in and account updates against the hosted auth service.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use viajero_core::credentials::{check_email, check_password_update};
use viajero_core::{SignUpForm, UserId};
use viajero_store::rest::reply_error;
use viajero_store::StoreError;

use crate::error::{AppError, Result};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user ID (JWT `sub` claim).
    pub user_id: UserId,
    /// Email address, when the service reports one.
    pub email: Option<String>,
    /// Bearer token for the data API.
    pub access_token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// JWT claims read from an access token.
#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
}

impl Session {
    /// Restore a session from a stored access token.
    ///
    /// The signature is not checked here; the data API verifies it on every
    /// request. Only the subject and expiry are read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` if the token cannot be decoded and
    /// `SessionExpired` if it has expired.
    pub fn from_access_token(token: &str) -> Result<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;
        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| AppError::InvalidToken(format!("bad exp {}", data.claims.exp)))?;

        let session = Self {
            user_id,
            email: data.claims.email,
            access_token: token.to_string(),
            expires_at,
        };
        if session.is_expired(Utc::now()) {
            return Err(AppError::SessionExpired);
        }
        Ok(session)
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is active and signed in.
    SignedIn(Session),
    /// A confirmation email was sent.
    ConfirmationSent,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            user_id: self.user.id,
            email: self.user.email,
            access_token: self.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(self.expires_in),
        }
    }
}

/// Auth service client.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
    redirect_url: String,
}

impl AuthClient {
    /// Create a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        redirect_url: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            redirect_url: redirect_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Create an account. The form is validated before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad form, `AlreadyRegistered` if the
    /// email is taken, or another error if the request fails.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpOutcome> {
        form.validate()?;
        let email = form.email.trim();

        let response = self
            .client
            .post(self.url("signup"))
            .query(&[("redirect_to", self.redirect_url.as_str())])
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": form.password,
                "data": { "display_name": form.display_name() },
            }))
            .send()
            .await
            .map_err(StoreError::from)?;
        let body: Value = handle_response(response).await?;

        if body.get("access_token").is_some() {
            let token: TokenResponse =
                serde_json::from_value(body).map_err(StoreError::from)?;
            info!(email = %email, "signed up and signed in");
            return Ok(SignUpOutcome::SignedIn(token.into_session()));
        }
        info!(email = %email, "sign-up confirmation sent");
        Ok(SignUpOutcome::ConfirmationSent)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for a wrong email or password, or
    /// another error if the request fails.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        check_email(email.trim())?;
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await
            .map_err(StoreError::from)?;
        let token: TokenResponse = handle_response(response).await?;
        let session = token.into_session();
        info!(user_id = %session.user_id, "signed in");
        Ok(session)
    }

    /// End the session on the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(StoreError::from)?;
        if !response.status().is_success() {
            let error = reply_error(response).await;
            warn!(user_id = %session.user_id, error = %error, "sign-out rejected");
            return Err(classify(error));
        }
        Ok(())
    }

    /// Change the account email. The service emails a confirmation link.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed address, or another error
    /// if the request fails.
    pub async fn update_email(&self, session: &Session, email: &str) -> Result<()> {
        check_email(email.trim())?;
        self.update_user(session, json!({ "email": email.trim() }))
            .await
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a short password, or another error if
    /// the request fails.
    pub async fn update_password(&self, session: &Session, password: &str) -> Result<()> {
        check_password_update(password)?;
        self.update_user(session, json!({ "password": password }))
            .await
    }

    async fn update_user(&self, session: &Session, body: Value) -> Result<()> {
        let response = self
            .client
            .put(self.url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from)?;
        let _: Value = handle_response(response).await?;
        info!(user_id = %session.user_id, "account updated");
        Ok(())
    }

    /// URL that starts an OAuth sign-in with `provider` and returns to the
    /// app afterwards.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the base URL is not a valid URL.
    pub fn authorize_url(&self, provider: &str) -> Result<String> {
        Url::parse_with_params(
            &self.url("authorize"),
            &[("provider", provider), ("redirect_to", self.redirect_url.as_str())],
        )
        .map(String::from)
        .map_err(|e| AppError::Configuration(e.to_string()))
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    if response.status().is_success() {
        return Ok(response.json().await.map_err(StoreError::from)?);
    }
    Err(classify(reply_error(response).await))
}

/// Map auth service messages to dedicated variants.
fn classify(error: StoreError) -> AppError {
    let message = match &error {
        StoreError::Api { message, .. }
        | StoreError::Unauthorized(message)
        | StoreError::Duplicate(message) => message.as_str(),
        _ => "",
    };
    if message.contains("User already registered") {
        AppError::AlreadyRegistered
    } else if message.contains("Invalid login credentials") {
        AppError::InvalidCredentials
    } else {
        AppError::Store(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const USER: &str = "5b0a6a43-8f6f-4b1c-9d58-2f8d6f3f2a11";

    fn token(exp: i64) -> String {
        encode(
            &Header::default(),
            &json!({ "sub": USER, "exp": exp, "aud": "authenticated", "email": "a@b.co" }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    #[test]
    fn restores_session_from_token() {
        let exp = Utc::now().timestamp() + 3600;
        let session = Session::from_access_token(&token(exp)).unwrap();
        assert_eq!(session.user_id.to_string(), USER);
        assert_eq!(session.email.as_deref(), Some("a@b.co"));
        assert_eq!(session.expires_at.timestamp(), exp);
    }

    #[test]
    fn expired_token_is_rejected() {
        let exp = Utc::now().timestamp() - 10;
        assert!(matches!(
            Session::from_access_token(&token(exp)),
            Err(AppError::SessionExpired)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert!(matches!(
            Session::from_access_token("not-a-jwt"),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn authorize_url_carries_redirect() {
        let client =
            AuthClient::new("https://p.supabase.co/", "anon", "https://x.io/viaje.ro/", 5).unwrap();
        let url = client.authorize_url("google").unwrap();
        assert!(url.starts_with("https://p.supabase.co/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=https%3A%2F%2Fx.io%2Fviaje.ro%2F"));
    }

    #[test]
    fn known_messages_get_dedicated_variants() {
        let taken = StoreError::from_reply(422, None, "User already registered".into());
        assert!(matches!(classify(taken), AppError::AlreadyRegistered));
        let wrong = StoreError::from_reply(400, None, "Invalid login credentials".into());
        assert!(matches!(classify(wrong), AppError::InvalidCredentials));
    }
}

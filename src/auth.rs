//! Operator sign-in for the admin console.

use std::time::Duration;

use log::info;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{self, RawlineConfig};
use crate::error::{RawlineError, Result};

/// A signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    /// Bearer token attached to store writes.
    pub id_token: String,
}

pub trait Authenticator: Send {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
}

// ---------------------------------------------------------------------------
// FirebaseAuth
// ---------------------------------------------------------------------------

/// Email/password sign-in against the hosted identity service.
pub struct FirebaseAuth {
    client: Client,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
}

impl FirebaseAuth {
    pub fn new(config: &RawlineConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            api_key: config.firebase_api_key.clone(),
        })
    }
}

impl Authenticator for FirebaseAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/accounts:signInWithPassword", config::IDENTITY_BASE);
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()?;

        if !resp.status().is_success() {
            let body: Value = resp.json().unwrap_or(Value::Null);
            let code = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN");
            return Err(RawlineError::Auth(describe_sign_in_error(code)));
        }

        let body: SignInResponse = resp.json()?;
        info!("Operator {} signed in", body.email);
        Ok(AuthSession {
            uid: body.local_id,
            email: body.email,
            id_token: body.id_token,
        })
    }
}

/// Readable text for the identity service's error codes. Codes may carry
/// a ` : detail` suffix.
pub fn describe_sign_in_error(code: &str) -> String {
    let key = code.split(" : ").next().unwrap_or(code).trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid credentials".to_string()
        }
        "INVALID_EMAIL" => "Invalid email address".to_string(),
        "USER_DISABLED" => "This account has been disabled".to_string(),
        k if k.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") => {
            "Too many attempts, try again later".to_string()
        }
        other => format!("Sign-in rejected ({})", other),
    }
}

// ---------------------------------------------------------------------------
// StaticAuthenticator
// ---------------------------------------------------------------------------

/// Accepts exactly one configured email/password pair. Used in offline
/// mode and tests.
pub struct StaticAuthenticator {
    email: String,
    password: String,
}

impl StaticAuthenticator {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        if email.eq_ignore_ascii_case(&self.email) && password == self.password {
            Ok(AuthSession {
                uid: "local-operator".to_string(),
                email: self.email.clone(),
                id_token: format!("local-token-{}", self.email),
            })
        } else {
            Err(RawlineError::Auth("Invalid credentials".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_errors_are_readable() {
        assert_eq!(describe_sign_in_error("INVALID_PASSWORD"), "Invalid credentials");
        assert_eq!(
            describe_sign_in_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            "Too many attempts, try again later"
        );
        assert_eq!(describe_sign_in_error("WEIRD"), "Sign-in rejected (WEIRD)");
    }

    #[test]
    fn static_authenticator_checks_both_fields() {
        let auth = StaticAuthenticator::new("ops@rawline.test", "pw");
        assert!(auth.sign_in("OPS@rawline.test", "pw").is_ok());
        assert!(auth.sign_in("ops@rawline.test", "nope").is_err());
    }
}

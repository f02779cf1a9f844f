//! Credential resolution for a session context.

use crate::context::SessionContext;
use crate::error::{AdminError, Result};
use reqwest::blocking::RequestBuilder;
use std::fmt;

/// Takes precedence over the token stored in the profile.
pub const ACCESS_TOKEN_ENV: &str = "STACKADM_ACCESS_TOKEN";

/// Signs requests on behalf of a session's subscription.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    subscription_id: Option<String>,
}

impl Credentials {
    pub fn bearer(access_token: impl Into<String>, subscription_id: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            subscription_id,
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription_id.as_deref()
    }

    pub fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"********")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

/// Produces credentials for a resolved context.
pub trait AuthenticationFactory {
    fn credentials(&self, context: &SessionContext) -> Result<Credentials>;
}

/// Uses an already-acquired bearer token; token acquisition happens elsewhere.
#[derive(Debug, Clone)]
pub struct TokenAuthenticationFactory {
    env_var: Option<&'static str>,
}

impl TokenAuthenticationFactory {
    pub fn new() -> Self {
        Self {
            env_var: Some(ACCESS_TOKEN_ENV),
        }
    }

    /// Ignores the environment and only uses the token stored on the account.
    pub fn profile_only() -> Self {
        Self { env_var: None }
    }
}

impl Default for TokenAuthenticationFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationFactory for TokenAuthenticationFactory {
    fn credentials(&self, context: &SessionContext) -> Result<Credentials> {
        let from_env = self
            .env_var
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty());

        let token = from_env
            .or_else(|| context.account.access_token.clone())
            .ok_or_else(|| {
                AdminError::credentials(format!(
                    "no access token for account '{}'",
                    context.account.id
                ))
            })?;

        Ok(Credentials::bearer(token, context.subscription_id.clone()))
    }
}

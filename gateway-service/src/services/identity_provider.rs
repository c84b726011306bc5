//! External identity provider capability.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use super::error::GatewayError;
use crate::config::GoogleOAuthConfig;
use crate::models::{IdentityAssertion, ProviderCallback};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Turns a provider redirect into an identity assertion. Errors never carry
/// provider details back to the caller.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn validate_and_fetch_profile(
        &self,
        callback: ProviderCallback,
    ) -> Result<IdentityAssertion, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google OpenID Connect, authorization-code flow with PKCE.
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    config: GoogleOAuthConfig,
    client: reqwest::Client,
}

impl GoogleIdentityProvider {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

/// Provider consent URL. `hd` restricts the account chooser to the trusted
/// domain; the gateway still validates the returned email itself.
pub fn google_authorization_url(
    config: &GoogleOAuthConfig,
    hosted_domain: &str,
    state: &str,
    code_challenge: &str,
) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}&code_challenge={}&code_challenge_method=S256&hd={}&prompt=select_account",
        GOOGLE_AUTH_URL,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(state),
        code_challenge,
        urlencoding::encode(hosted_domain),
    )
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn validate_and_fetch_profile(
        &self,
        callback: ProviderCallback,
    ) -> Result<IdentityAssertion, GatewayError> {
        let token_res = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", callback.code.as_str()),
                ("code_verifier", callback.code_verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to exchange Google code");
                GatewayError::ProviderRejected
            })?;

        if !token_res.status().is_success() {
            tracing::error!(status = %token_res.status(), "Google token exchange refused");
            return Err(GatewayError::ProviderRejected);
        }

        let token: GoogleTokenResponse = token_res.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Google token response");
            GatewayError::ProviderRejected
        })?;

        let info: GoogleUserInfo = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch Google user info");
                GatewayError::ProviderRejected
            })?
            .json()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to parse Google user info");
                GatewayError::ProviderRejected
            })?;

        Ok(IdentityAssertion {
            email: info.email,
            email_verified: info.email_verified,
            name: info.name,
            picture: info.picture,
            provider: "google".to_string(),
        })
    }
}

/// Provider that answers from a fixed table of authorization codes.
#[derive(Default)]
pub struct MockIdentityProvider {
    assertions: DashMap<String, IdentityAssertion>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, code: impl Into<String>, assertion: IdentityAssertion) {
        self.assertions.insert(code.into(), assertion);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn validate_and_fetch_profile(
        &self,
        callback: ProviderCallback,
    ) -> Result<IdentityAssertion, GatewayError> {
        self.assertions
            .get(&callback.code)
            .map(|a| a.clone())
            .ok_or(GatewayError::ProviderRejected)
    }
}

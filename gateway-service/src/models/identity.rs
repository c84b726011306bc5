//! Identity assertions handed over by the external identity provider.

use serde::Deserialize;

/// Claim that the signed-in party owns `email`. Ephemeral: never persisted
/// as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityAssertion {
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub provider: String,
}

/// What the provider redirect hands back to the gateway.
#[derive(Debug, Clone)]
pub struct ProviderCallback {
    pub code: String,
    pub code_verifier: String,
}

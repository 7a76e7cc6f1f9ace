//! Module configuration.

use secrecy::SecretString;
use serde::Deserialize;

fn default_subscription_key_header() -> String {
    "x-subscription-key".to_owned()
}

/// Settings for the downstream invoicing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownstreamConfig {
    /// Base URL of the invoicing service, e.g. `https://invoices.internal`.
    pub base_url: String,

    /// Resource identifier (OAuth scope) requested from the identity
    /// provider when exchanging for a delegated credential.
    pub resource: String,

    /// Header name carrying the service subscription key.
    #[serde(default = "default_subscription_key_header")]
    pub subscription_key_header: String,

    /// Subscription key sent alongside the delegated bearer token.
    pub subscription_key: SecretString,
}

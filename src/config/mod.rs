use serde::Deserialize;
use std::env;

use crate::core::{AmountRule, HarnessError, Result};
use crate::modules::signing::TokenScheme;

/// Default OnePay checkout endpoint
pub const DEFAULT_CHECKOUT_URL: &str = "https://ipg.onepay.lk/ipg/checkout/";

/// Main harness configuration
///
/// Everything the flow and runner need is carried here explicitly; there is
/// no module-level mutable state anywhere in the harness.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Base URL of the donation backend under test
    pub base_url: String,
    pub gateway: GatewayConfig,
    /// Per-HTTP-call timeout; scenarios have no timeout of their own
    pub timeout_ms: u64,
    /// Upper bound on concurrently running flows within a concurrent group
    pub concurrency: usize,
}

/// Gateway credentials and contract parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub app_id: String,
    pub app_secret: String,
    pub checkout_url: String,
    /// Where the gateway should send the customer after payment
    pub redirect_url: String,
    pub token_scheme: TokenScheme,
    pub amount_rule: AmountRule,
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let base_url = env::var("HARNESS_BASE_URL").unwrap_or_default();

        let config = HarnessConfig {
            gateway: GatewayConfig {
                app_id: env::var("ONEPAY_APP_ID").map_err(|_| {
                    HarnessError::configuration("ONEPAY_APP_ID not set")
                })?,
                app_secret: env::var("ONEPAY_APP_SECRET").map_err(|_| {
                    HarnessError::configuration("ONEPAY_APP_SECRET not set")
                })?,
                checkout_url: env::var("ONEPAY_CHECKOUT_URL")
                    .unwrap_or_else(|_| DEFAULT_CHECKOUT_URL.to_string()),
                redirect_url: env::var("ONEPAY_REDIRECT_URL")
                    .unwrap_or_else(|_| format!("{}/donation-success", base_url.trim_end_matches('/'))),
                token_scheme: env::var("ONEPAY_TOKEN_SCHEME")
                    .unwrap_or_else(|_| "sha256".to_string())
                    .parse()
                    .map_err(HarnessError::configuration)?,
                amount_rule: env::var("HARNESS_AMOUNT_RULE")
                    .unwrap_or_else(|_| "minor-to-major".to_string())
                    .parse()
                    .map_err(HarnessError::configuration)?,
            },
            base_url,
            timeout_ms: env::var("HARNESS_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| HarnessError::configuration("Invalid HARNESS_TIMEOUT_MS"))?,
            concurrency: env::var("HARNESS_CONCURRENCY")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| HarnessError::configuration("Invalid HARNESS_CONCURRENCY"))?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(HarnessError::configuration(
                "Backend base URL must be set (HARNESS_BASE_URL or --base-url)",
            ));
        }
        if self.gateway.app_id.is_empty() {
            return Err(HarnessError::configuration("Gateway app id must not be empty"));
        }
        if self.gateway.app_secret.is_empty() {
            return Err(HarnessError::configuration(
                "Gateway app secret must not be empty",
            ));
        }
        if self.gateway.checkout_url.is_empty() {
            return Err(HarnessError::configuration(
                "Gateway checkout URL must not be empty",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(HarnessError::configuration(
                "Timeout must be greater than 0",
            ));
        }
        if self.concurrency == 0 {
            return Err(HarnessError::configuration(
                "Concurrency must be greater than 0",
            ));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::{HarnessError, Result};

/// Length of the app-token hash prefix
const APP_TOKEN_PREFIX_LEN: usize = 32;

/// Token length convention expected from the gateway integration
///
/// Two conventions exist in the wild: the full 64-character SHA-256 hex
/// digest and a legacy variant truncated to its leading 32 characters.
/// Neither is authoritative, so the scheme under test is configuration and
/// a mismatch is reported as contract drift instead of silently accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenScheme {
    /// Full SHA-256 digest, 64 uppercase hex characters
    Sha256,
    /// Leading 32 characters of the SHA-256 digest
    Legacy32,
}

impl TokenScheme {
    /// Expected hash token length under this scheme
    pub fn token_len(&self) -> usize {
        match self {
            TokenScheme::Sha256 => 64,
            TokenScheme::Legacy32 => 32,
        }
    }
}

impl std::str::FromStr for TokenScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(TokenScheme::Sha256),
            "legacy32" | "legacy-32" => Ok(TokenScheme::Legacy32),
            _ => Err(format!("Invalid token scheme: {}", s)),
        }
    }
}

impl fmt::Display for TokenScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenScheme::Sha256 => write!(f, "sha256"),
            TokenScheme::Legacy32 => write!(f, "legacy32"),
        }
    }
}

/// Computes the integrity token pair the gateway requires
///
/// The hash covers `appid || amount || orderReference || secret` as UTF-8
/// text. No nonce or timestamp enters the digest; determinism is part of the
/// contract and is itself a property under test.
pub struct HashSigner {
    app_id: String,
    secret_key: String,
    scheme: TokenScheme,
}

impl HashSigner {
    pub fn new(app_id: impl Into<String>, secret_key: impl Into<String>, scheme: TokenScheme) -> Self {
        Self {
            app_id: app_id.into(),
            secret_key: secret_key.into(),
            scheme,
        }
    }

    pub fn scheme(&self) -> TokenScheme {
        self.scheme
    }

    /// Computes the hash token for a transaction
    ///
    /// Returns uppercase hex, truncated to 32 characters under the legacy
    /// scheme. Fails with a validation error on empty app id, empty order
    /// reference, or a non-positive amount.
    pub fn hash_token(&self, amount_major: i64, order_reference: &str) -> Result<String> {
        if self.app_id.is_empty() {
            return Err(HarnessError::validation("app id must not be empty"));
        }
        if order_reference.is_empty() {
            return Err(HarnessError::validation("order reference must not be empty"));
        }
        if amount_major <= 0 {
            return Err(HarnessError::validation(format!(
                "gateway amount must be positive, got {}",
                amount_major
            )));
        }

        let mut hasher = Sha256::new();
        hasher.update(self.app_id.as_bytes());
        hasher.update(amount_major.to_string().as_bytes());
        hasher.update(order_reference.as_bytes());
        hasher.update(self.secret_key.as_bytes());
        let digest = hex::encode_upper(hasher.finalize());

        Ok(match self.scheme {
            TokenScheme::Sha256 => digest,
            TokenScheme::Legacy32 => digest[..APP_TOKEN_PREFIX_LEN].to_string(),
        })
    }

    /// Derives the app token: the first 32 characters of the hash token
    /// joined to the app id with a dot
    pub fn app_token(&self, hash_token: &str) -> Result<String> {
        let prefix = hash_token.get(..APP_TOKEN_PREFIX_LEN).ok_or_else(|| {
            HarnessError::validation(format!(
                "hash token must be at least {} characters, got {}",
                APP_TOKEN_PREFIX_LEN,
                hash_token.len()
            ))
        })?;
        Ok(format!("{}.{}", prefix, self.app_id))
    }

    /// Asserts that an observed token matches the configured scheme
    ///
    /// Used against tokens extracted from the backend's payment page; a
    /// wrong length or a non-hex character means the integration contract
    /// has drifted from the scheme under test.
    pub fn verify_token(&self, token: &str) -> Result<()> {
        let expected = self.scheme.token_len();
        if token.len() != expected {
            return Err(HarnessError::contract_drift(format!(
                "hash token is {} characters, expected {} for scheme {}",
                token.len(),
                expected,
                self.scheme
            )));
        }
        if let Some(bad) = token.chars().find(|c| !c.is_ascii_hexdigit() || c.is_ascii_lowercase()) {
            return Err(HarnessError::contract_drift(format!(
                "hash token contains non-uppercase-hex character {:?}",
                bad
            )));
        }
        Ok(())
    }
}

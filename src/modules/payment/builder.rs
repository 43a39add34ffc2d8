use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::core::{HarnessError, Result};
use crate::modules::signing::HashSigner;

use super::models::{CustomerInfo, DonationRecord, PaymentGatewayPayload};

/// Gateway-imposed limit on customer name fields
const MAX_NAME_LEN: usize = 50;

/// Assembles a complete, schema-valid gateway payload from a donation record
///
/// The minor-to-major amount conversion happens exactly here; everything
/// upstream of payload construction stays in minor units.
pub struct PaymentRequestBuilder {
    gateway: GatewayConfig,
    signer: HashSigner,
}

impl PaymentRequestBuilder {
    pub fn new(gateway: GatewayConfig) -> Self {
        let signer = HashSigner::new(
            gateway.app_id.clone(),
            gateway.app_secret.clone(),
            gateway.token_scheme,
        );
        Self { gateway, signer }
    }

    pub fn signer(&self) -> &HashSigner {
        &self.signer
    }

    /// Builds the full payload for one gateway submission
    ///
    /// Names longer than 50 characters are silently truncated (the gateway
    /// tolerates truncation but rejects overlength values); an
    /// un-normalizable phone number is a validation error.
    pub fn build(
        &self,
        donation: &DonationRecord,
        customer: &CustomerInfo,
    ) -> Result<PaymentGatewayPayload> {
        let order_reference = donation.payment_reference.as_deref().ok_or_else(|| {
            HarnessError::validation("donation record has no payment reference")
        })?;

        let amount = self
            .gateway
            .amount_rule
            .gateway_amount(donation.currency, donation.amount_minor)
            .map_err(HarnessError::validation)?;

        let hash_token = self.signer.hash_token(amount, order_reference)?;
        let apptoken = self.signer.app_token(&hash_token)?;

        Ok(PaymentGatewayPayload {
            appid: self.gateway.app_id.clone(),
            amount,
            order_reference: order_reference.to_string(),
            customer_first_name: truncate_chars(&customer.first_name, MAX_NAME_LEN),
            customer_last_name: truncate_chars(&customer.last_name, MAX_NAME_LEN),
            customer_email: customer.email.clone(),
            customer_phone_number: normalize_phone(&customer.phone_number)?,
            transaction_redirect_url: self.gateway.redirect_url.clone(),
            additional_data: format!("harness_{}", Uuid::new_v4().simple()),
            hash_token,
            apptoken,
        })
    }
}

/// Truncates to at most `max` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Normalizes a phone number to the `+94XXXXXXXXX` national format
///
/// Accepts `+94XXXXXXXXX`, `94XXXXXXXXX` and `0XXXXXXXXX` (nine significant
/// digits), with spaces and dashes tolerated as separators.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let invalid = || {
        HarnessError::validation(format!(
            "phone number {:?} cannot be normalized to +94XXXXXXXXX",
            raw
        ))
    };

    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    let subscriber = if let Some(rest) = compact.strip_prefix("+94") {
        rest
    } else if let Some(rest) = compact.strip_prefix("94") {
        rest
    } else if let Some(rest) = compact.strip_prefix('0') {
        rest
    } else {
        return Err(invalid());
    };

    if subscriber.len() != 9 || !subscriber.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(format!("+94{}", subscriber))
}

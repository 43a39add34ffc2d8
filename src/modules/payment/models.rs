use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{Currency, HarnessError, Result};

/// A donation the harness asks the backend to create
///
/// Immutable; has no identity until the backend accepts it. Amounts are in
/// minor currency units, matching the backend's storage convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    #[serde(rename = "amount")]
    pub amount_minor: i64,

    pub currency: Currency,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DonationRequest {
    pub fn new(amount_minor: i64, currency: Currency) -> Self {
        Self {
            amount_minor,
            currency,
            donor_name: None,
            donor_email: None,
            message: None,
        }
    }

    /// Validates the request before it is sent anywhere
    pub fn validate(&self) -> Result<()> {
        if self.amount_minor < 1 {
            return Err(HarnessError::validation(format!(
                "donation amount must be at least 1 minor unit, got {}",
                self.amount_minor
            )));
        }
        if let Some(email) = &self.donor_email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Status of a donation as reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Pending,
    Submitted,
    Completed,
    Failed,
}

/// A donation record issued by the backend
///
/// The backend owns this record; the harness treats it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    #[serde(deserialize_with = "de_flexible_string")]
    pub id: String,

    #[serde(rename = "amount")]
    pub amount_minor: i64,

    pub currency: Currency,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Opaque reference correlating the record with a gateway transaction.
    /// Filled from the issued payment URL when the backend omits it.
    #[serde(default)]
    pub payment_reference: Option<String>,

    #[serde(default)]
    pub status: DonationStatus,
}

/// Customer fields required by the gateway payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl Default for CustomerInfo {
    fn default() -> Self {
        Self {
            first_name: "Harness".to_string(),
            last_name: "Donor".to_string(),
            email: "donor@example.com".to_string(),
            phone_number: "+94771234567".to_string(),
        }
    }
}

impl CustomerInfo {
    /// Derives customer fields from a donation's donor information,
    /// falling back to harness defaults for anything missing
    pub fn for_donation(request: &DonationRequest) -> Self {
        let mut customer = Self::default();
        if let Some(name) = &request.donor_name {
            let mut parts = name.trim().splitn(2, char::is_whitespace);
            if let Some(first) = parts.next().filter(|s| !s.is_empty()) {
                customer.first_name = first.to_string();
            }
            if let Some(last) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
                customer.last_name = last.to_string();
            }
        }
        if let Some(email) = &request.donor_email {
            customer.email = email.clone();
        }
        customer
    }
}

/// The complete form payload submitted to the gateway checkout endpoint
///
/// Field names follow the gateway's wire format. Derived deterministically
/// from a donation record plus the shared secret; recomputed fresh per
/// submission and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentGatewayPayload {
    pub appid: String,
    pub amount: i64,
    #[serde(rename = "orderReference")]
    pub order_reference: String,
    #[serde(rename = "customerFirstName")]
    pub customer_first_name: String,
    #[serde(rename = "customerLastName")]
    pub customer_last_name: String,
    #[serde(rename = "customerEmail")]
    pub customer_email: String,
    #[serde(rename = "customerPhoneNumber")]
    pub customer_phone_number: String,
    #[serde(rename = "transactionRedirectUrl")]
    pub transaction_redirect_url: String,
    #[serde(rename = "additionalData")]
    pub additional_data: String,
    #[serde(rename = "hashToken")]
    pub hash_token: String,
    pub apptoken: String,
}

impl PaymentGatewayPayload {
    /// Renders the payload as `application/x-www-form-urlencoded` pairs
    pub fn to_form(&self) -> Vec<(String, String)> {
        vec![
            ("appid".to_string(), self.appid.clone()),
            ("amount".to_string(), self.amount.to_string()),
            ("orderReference".to_string(), self.order_reference.clone()),
            ("customerFirstName".to_string(), self.customer_first_name.clone()),
            ("customerLastName".to_string(), self.customer_last_name.clone()),
            ("customerEmail".to_string(), self.customer_email.clone()),
            ("customerPhoneNumber".to_string(), self.customer_phone_number.clone()),
            (
                "transactionRedirectUrl".to_string(),
                self.transaction_redirect_url.clone(),
            ),
            ("additionalData".to_string(), self.additional_data.clone()),
            ("hashToken".to_string(), self.hash_token.clone()),
            ("apptoken".to_string(), self.apptoken.clone()),
        ]
    }
}

/// Pragmatic RFC-5322 subset: one `@`, non-empty local part, a dotted
/// domain, no whitespace
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || HarnessError::validation(format!("invalid donor email: {}", email));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    Ok(())
}

/// Accepts backend ids that arrive as either JSON numbers or strings
fn de_flexible_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

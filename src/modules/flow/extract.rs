use serde::{Deserialize, Deserializer};

use crate::core::{HarnessError, Result};

/// Marker under which the backend embeds the gateway configuration
///
/// The backend contract is to embed exactly one well-formed JSON object
/// assignment under this marker in the payment page.
pub const EMBEDDED_CONFIG_MARKER: &str = "window.onePayData";

/// Gateway configuration object embedded in the payment page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPageConfig {
    pub appid: String,

    /// Some backend builds embed the amount as a JSON number, others as a
    /// string; both are accepted
    #[serde(deserialize_with = "de_flexible_amount")]
    pub amount: i64,

    pub order_reference: String,
    pub hash_token: String,
    pub apptoken: String,

    #[serde(default)]
    pub customer_first_name: Option<String>,
    #[serde(default)]
    pub customer_last_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone_number: Option<String>,
    #[serde(default)]
    pub transaction_redirect_url: Option<String>,
    #[serde(default)]
    pub additional_data: Option<String>,
}

/// Parses the embedded configuration object out of a payment page
///
/// Fails if the marker is absent, appears more than once, or the text under
/// it is not a single valid JSON object. Any of those is a backend contract
/// violation, not a harness bug.
pub fn extract_embedded_config(html: &str) -> Result<GatewayPageConfig> {
    let start = html.find(EMBEDDED_CONFIG_MARKER).ok_or_else(|| {
        HarnessError::extraction(format!(
            "embedded config marker {:?} not found in payment page",
            EMBEDDED_CONFIG_MARKER
        ))
    })?;

    let after_marker = start + EMBEDDED_CONFIG_MARKER.len();
    if html[after_marker..].contains(EMBEDDED_CONFIG_MARKER) {
        return Err(HarnessError::extraction(format!(
            "embedded config marker {:?} appears more than once",
            EMBEDDED_CONFIG_MARKER
        )));
    }

    let rest = html[after_marker..].trim_start();
    let rest = rest.strip_prefix('=').ok_or_else(|| {
        HarnessError::extraction("embedded config marker is not followed by an assignment")
    })?;
    let rest = rest.trim_start();
    if !rest.starts_with('{') {
        return Err(HarnessError::extraction(
            "embedded config assignment does not open a JSON object",
        ));
    }

    let object = balanced_object(rest)?;
    serde_json::from_str(object).map_err(|e| {
        HarnessError::extraction(format!("embedded config is not valid JSON: {}", e))
    })
}

/// Returns the slice covering one balanced `{...}` object starting at the
/// first byte, honoring string literals and escapes
fn balanced_object(s: &str) -> Result<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&s[..idx + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Err(HarnessError::extraction(
        "embedded config object is not terminated",
    ))
}

fn de_flexible_amount<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("amount is not an integer")),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("amount {:?} is not an integer", s))),
        other => Err(serde::de::Error::custom(format!(
            "unexpected amount type: {}",
            other
        ))),
    }
}

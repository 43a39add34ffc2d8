use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies the donation backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Sri Lankan Rupee (2 decimal places)
    LKR,
    /// US Dollar (2 decimal places)
    USD,
}

impl Currency {
    /// Returns the decimal scale for this currency
    pub fn scale(&self) -> u32 {
        match self {
            Currency::LKR | Currency::USD => 2,
        }
    }

    /// Minor units per major unit (10^scale)
    pub fn minor_per_major(&self) -> i64 {
        10i64.pow(self.scale())
    }

    /// Converts an amount in minor units to whole major units.
    ///
    /// The gateway only accepts whole major-unit amounts, so a remainder
    /// is an error rather than something to round away.
    pub fn to_major_units(&self, amount_minor: i64) -> Result<i64, String> {
        let divisor = self.minor_per_major();
        if amount_minor % divisor != 0 {
            return Err(format!(
                "{} amount of {} minor units is not a whole number of major units",
                self, amount_minor
            ));
        }
        Ok(amount_minor / divisor)
    }

    /// Formats an amount given in minor units for display
    pub fn format_minor(&self, amount_minor: i64) -> String {
        let amount = Decimal::new(amount_minor, self.scale());
        format!("{} {:.width$}", self, amount, width = self.scale() as usize)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::LKR => write!(f, "LKR"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LKR" => Ok(Currency::LKR),
            "USD" => Ok(Currency::USD),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

/// How backend-stored amounts translate into the amount sent to the gateway.
///
/// The observed backend behavior is inconsistent between deployments, so the
/// rule is configuration, not a hard-coded assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmountRule {
    /// Divide stored minor units by 10^scale; remainders are invalid
    MinorToMajor,
    /// Forward the stored amount to the gateway unchanged
    PassThrough,
}

impl AmountRule {
    /// Computes the amount the gateway payload must carry
    pub fn gateway_amount(&self, currency: Currency, amount_minor: i64) -> Result<i64, String> {
        match self {
            AmountRule::MinorToMajor => currency.to_major_units(amount_minor),
            AmountRule::PassThrough => Ok(amount_minor),
        }
    }
}

impl std::str::FromStr for AmountRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minor-to-major" | "minor_to_major" => Ok(AmountRule::MinorToMajor),
            "pass-through" | "pass_through" => Ok(AmountRule::PassThrough),
            _ => Err(format!("Invalid amount rule: {}", s)),
        }
    }
}

impl fmt::Display for AmountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountRule::MinorToMajor => write!(f, "minor-to-major"),
            AmountRule::PassThrough => write!(f, "pass-through"),
        }
    }
}

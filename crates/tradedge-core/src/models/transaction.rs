//! Package transaction records from the transactions service.
//!
//! Ids, prices, and amounts arrive as either JSON numbers or strings
//! depending on the record's age, so the deserializers here accept both.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A monetary value parsed the way a lenient float parser would.
///
/// `None` means the value was missing or not numeric; such values never
/// compare equal to anything, including each other.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Amount(Option<f64>);

impl Amount {
    pub fn new(value: f64) -> Self {
        Self(Some(value))
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<f64> {
        self.0.filter(|v| !v.is_nan())
    }

    /// Numeric equality. Missing or NaN on either side is never equal.
    pub fn numeric_eq(&self, other: &Amount) -> bool {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
    /// `"100.50 INR"` parses as `100.5`; `"abc"` does not parse.
    pub fn parse_lenient(s: &str) -> Self {
        let trimmed = s.trim_start();
        let candidate: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
            .collect();

        for end in (1..=candidate.len()).rev() {
            if let Ok(v) = candidate[..end].parse::<f64>() {
                return Self(Some(v));
            }
        }
        Self(None)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or numeric string")
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Amount(Some(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Amount(Some(v as f64)))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Amount(Some(v as f64)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Amount::parse_lenient(v))
            }

            fn visit_bool<E>(self, _v: bool) -> Result<Self::Value, E> {
                Ok(Amount(None))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Amount(None))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Amount(None))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Payment state of a single payment-history entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum PaymentStatus {
    Pending,
    Completed,
    /// Anything else the service reports, kept verbatim.
    Other(String),
    /// No status on the entry.
    #[default]
    Unknown,
}

impl From<Option<String>> for PaymentStatus {
    fn from(value: Option<String>) -> Self {
        match value {
            None => PaymentStatus::Unknown,
            Some(s) if s == "completed" => PaymentStatus::Completed,
            Some(s) if s == "pending" => PaymentStatus::Pending,
            Some(s) => PaymentStatus::Other(s),
        }
    }
}

impl From<PaymentStatus> for Option<String> {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => Some("pending".to_string()),
            PaymentStatus::Completed => Some("completed".to_string()),
            PaymentStatus::Other(s) => Some(s),
            PaymentStatus::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntry {
    #[serde(default)]
    pub amount: Amount,
    #[serde(rename = "payment_status", default)]
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDetails {
    /// Missing on some legacy records; such records are never purchased.
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub subtype_id: Option<String>,
    #[serde(default)]
    pub package_price: Amount,
    #[serde(default)]
    pub package_name: Option<String>,
}

/// One purchased-or-attempted package with its payment history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub package_details: PackageDetails,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_history: Vec<PaymentEntry>,
}

impl TransactionRecord {
    pub fn new(package_id: impl Into<String>, price: f64, payments: Vec<PaymentEntry>) -> Self {
        Self {
            package_details: PackageDetails {
                subtype_id: Some(package_id.into()),
                package_price: Amount::new(price),
                package_name: None,
            },
            payment_history: payments,
        }
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package_details
            .subtype_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    pub fn declared_price(&self) -> Amount {
        self.package_details.package_price
    }

    pub fn first_payment(&self) -> Option<&PaymentEntry> {
        self.payment_history.first()
    }
}

impl PaymentEntry {
    pub fn new(amount: f64, status: PaymentStatus) -> Self {
        Self {
            amount: Amount::new(amount),
            status,
        }
    }
}

// null reads as the field's default, same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Ids show up as "9" or 9 depending on the record
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumberVisitor;

    impl<'de> de::Visitor<'de> for StringOrNumberVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

//! The closed set of currencies that payments can be recorded in.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A canonical currency code.
///
/// Parsing is the only place where legacy aliases are normalized, so every `Currency` value in
/// memory is canonical and can be compared directly:
///
/// ```
/// # use paytrack::model::Currency;
/// # use std::str::FromStr;
/// assert_eq!(Currency::from_str("TL").unwrap(), Currency::Try);
/// assert_eq!(Currency::from_str("try").unwrap().to_string(), "TRY");
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Currency {
    Try,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// All canonical currencies in a stable order.
    pub const ALL: [Currency; 4] = [Currency::Try, Currency::Usd, Currency::Eur, Currency::Gbp];

    /// The ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Try => "₺",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    /// Maps a currency code, possibly a legacy alias, onto its canonical currency.
    pub fn normalize(code: &str) -> Option<Currency> {
        match code.trim().to_ascii_uppercase().as_str() {
            "TRY" | "TL" => Some(Currency::Try),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Try
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned when a string is not a known currency code or alias.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("Unknown currency code '{0}', expected one of TRY (or TL), USD, EUR, GBP")]
pub struct UnknownCurrency(String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::normalize(s).ok_or_else(|| UnknownCurrency(s.to_string()))
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Currency::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_alias_is_normalized() {
        assert_eq!(Currency::from_str("TL").unwrap(), Currency::Try);
        assert_eq!(Currency::from_str(" tl ").unwrap(), Currency::Try);
        assert_eq!(Currency::from_str("TRY").unwrap(), Currency::Try);
    }

    #[test]
    fn test_unknown_code() {
        let err = Currency::from_str("JPY").unwrap_err();
        assert!(err.to_string().contains("JPY"));
    }

    #[test]
    fn test_serializes_canonical_code() {
        let c: Currency = serde_json::from_str("\"TL\"").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"TRY\"");
    }

    #[test]
    fn test_map_keys() {
        let map: BTreeMap<Currency, f64> =
            serde_json::from_str(r#"{"TL": 1.0, "EUR": 50.0}"#).unwrap();
        assert_eq!(map.get(&Currency::Try), Some(&1.0));
        assert_eq!(map.get(&Currency::Eur), Some(&50.0));
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"TRY":1.0,"EUR":50.0}"#);
    }
}

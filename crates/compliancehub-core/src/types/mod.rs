//! Data-transfer shapes mirrored from the API.
//!
//! Field names match the server's JSON. Server-computed or optional fields
//! default when absent so partial payloads (list serializers, nested
//! summaries) still deserialize.

pub mod auth;
pub mod compliance;
pub mod controls;
pub mod evidence;
pub mod library;
pub mod organizations;

/// Lenient decimal decoding.
///
/// Decimal columns are serialized by the server as strings (`"85.50"`), while
/// computed values arrive as plain numbers. Both decode into `f64`.
pub mod decimal {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse(raw: Raw) -> Result<Option<f64>, String> {
        match raw {
            Raw::Number(n) => Ok(Some(n)),
            Raw::Text(s) if s.trim().is_empty() => Ok(None),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("invalid decimal string: {:?}", s)),
        }
    }

    /// Required decimal. A blank string decodes as zero.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = Raw::deserialize(deserializer)?;
        parse(raw)
            .map(|v| v.unwrap_or(0.0))
            .map_err(de::Error::custom)
    }

    /// Nullable decimal. `null` and blank strings decode as `None`.
    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<f64>, D::Error> {
            match Option::<Raw>::deserialize(deserializer)? {
                Some(raw) => parse(raw).map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

pub use auth::*;
pub use compliance::*;
pub use controls::*;
pub use evidence::*;
pub use library::*;
pub use organizations::*;

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Score {
        #[serde(deserialize_with = "super::decimal::deserialize")]
        value: f64,
        #[serde(default, deserialize_with = "super::decimal::option::deserialize")]
        cost: Option<f64>,
    }

    #[test]
    fn test_decimal_from_string_or_number() {
        let a: Score = serde_json::from_str(r#"{"value": "85.50", "cost": "1200.00"}"#).unwrap();
        assert_eq!(a.value, 85.5);
        assert_eq!(a.cost, Some(1200.0));

        let b: Score = serde_json::from_str(r#"{"value": 72, "cost": null}"#).unwrap();
        assert_eq!(b.value, 72.0);
        assert_eq!(b.cost, None);

        let c: Score = serde_json::from_str(r#"{"value": 0.25}"#).unwrap();
        assert_eq!(c.cost, None);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let r: Result<Score, _> = serde_json::from_str(r#"{"value": "eighty"}"#);
        assert!(r.is_err());
    }
}

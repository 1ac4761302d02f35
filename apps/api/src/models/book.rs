use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

fn deserialize_f64_from_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Null,
    }

    let value = match StringOrFloat::deserialize(deserializer)? {
        StringOrFloat::String(s) if s.trim().is_empty() => 0.0,
        StringOrFloat::String(s) => f64::from_str(s.trim()).map_err(serde::de::Error::custom)?,
        StringOrFloat::Float(f) => f,
        StringOrFloat::Null => 0.0,
    };

    if !value.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "expected a finite rating, got {}",
            value
        )));
    }

    Ok(value)
}

fn deserialize_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(u64),
        // CSV exports sometimes carry counts as "300.0"
        Float(f64),
        Null,
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                u64::from_str(s).map(Some).map_err(serde::de::Error::custom)
            }
        }
        StringOrInt::Int(i) => Ok(Some(i)),
        StringOrInt::Float(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => {
            Ok(Some(f as u64))
        }
        StringOrInt::Float(f) => Err(serde::de::Error::custom(format!(
            "expected a non-negative whole count, got {}",
            f
        ))),
        StringOrInt::Null => Ok(None),
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_u64(deserializer).map(Option::unwrap_or_default)
}

fn deserialize_language<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let code: Option<String> = Option::deserialize(deserializer)?;
    Ok(code.filter(|c| !c.trim().is_empty()))
}

/// One catalog row. Columns the recommender does not use (authors, isbn, ...)
/// are kept in `extra` so responses carry the full record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(
        default,
        alias = "rating",
        deserialize_with = "deserialize_f64_from_string"
    )]
    pub average_rating: f64,
    #[serde(
        default,
        alias = "ratingsCount",
        deserialize_with = "deserialize_count"
    )]
    pub ratings_count: u64,
    #[serde(
        default,
        alias = "  num_pages",
        alias = "page_count",
        deserialize_with = "deserialize_optional_u64"
    )]
    pub num_pages: Option<u64>,
    #[serde(default, alias = "language", deserialize_with = "deserialize_language")]
    pub language_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        average_rating: f64,
        ratings_count: u64,
        num_pages: Option<u64>,
        language_code: Option<&str>,
    ) -> Self {
        Self {
            title: title.into(),
            average_rating,
            ratings_count,
            num_pages,
            language_code: language_code.map(str::to_string),
            extra: Map::new(),
        }
    }
}

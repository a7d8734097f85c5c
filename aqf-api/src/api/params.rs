//! Lenient numeric request fields
//!
//! Browser clients send numbers as JSON numbers or as strings taken straight
//! from form inputs. Both forms are accepted; fractional numbers are truncated
//! toward zero when an integer is wanted. Strings must parse as the target
//! type, so `"12.5"` is not a valid integer.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

/// `Option<i64>` from a number or a numeric string; use with `#[serde(default)]`
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match raw {
        Numeric::Int(value) => Ok(Some(value)),
        // `as` saturates, so huge values still fail the caller's range check
        Numeric::Float(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
        Numeric::Float(value) => Err(D::Error::custom(format!("invalid integer: {}", value))),
        Numeric::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid integer: {:?}", text))),
    }
}

/// `Option<f64>` from a number or a numeric string; use with `#[serde(default)]`
pub fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let value = match raw {
        Numeric::Int(value) => value as f64,
        Numeric::Float(value) => value,
        Numeric::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid number: {:?}", text)))?,
    };

    if !value.is_finite() {
        return Err(D::Error::custom(format!("invalid number: {}", value)));
    }
    Ok(Some(value))
}

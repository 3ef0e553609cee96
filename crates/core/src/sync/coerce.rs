//! Lenient scalar coercion for snapshot fields.
//!
//! BIM exports are loose about types: a floor may arrive as `1` or `"1"`,
//! an area as `12.5` or `"12,5"`. These deserializers fold all of them into
//! the text/number the registry stores.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Scalar -> trimmed text. Null and blank strings become `None`.
pub(crate) fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean_text(&s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar value, found {}",
            kind_name(&other)
        ))),
    }
}

/// Number or numeric string -> `f64`. Accepts a comma decimal separator.
pub(crate) fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("number is out of range"))?,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("'{trimmed}' is not a number")))?
        }
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a number, found {}",
                kind_name(&other)
            )))
        }
    };

    if !number.is_finite() {
        return Err(D::Error::custom("number must be finite"));
    }
    Ok(Some(number))
}

/// Trim and drop blank text.
pub fn clean_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Compare stored text with incoming text under the same cleaning rules.
pub(crate) fn same_text(stored: Option<&str>, incoming: Option<&str>) -> bool {
    stored.and_then(clean_text) == incoming.and_then(clean_text)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_text")]
        text: Option<String>,
        #[serde(default, deserialize_with = "opt_number")]
        number: Option<f64>,
    }

    fn probe(value: Value) -> Result<Probe, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn text_accepts_scalars() {
        assert_eq!(probe(json!({"text": " F12 "})).unwrap().text.as_deref(), Some("F12"));
        assert_eq!(probe(json!({"text": 12})).unwrap().text.as_deref(), Some("12"));
        assert_eq!(probe(json!({"text": true})).unwrap().text.as_deref(), Some("true"));
        assert_eq!(probe(json!({"text": "  "})).unwrap().text, None);
        assert_eq!(probe(json!({"text": null})).unwrap().text, None);
        assert_eq!(probe(json!({})).unwrap().text, None);
    }

    #[test]
    fn text_rejects_structures() {
        assert!(probe(json!({"text": [1]})).is_err());
        assert!(probe(json!({"text": {"a": 1}})).is_err());
    }

    #[test]
    fn number_accepts_numeric_strings() {
        assert_eq!(probe(json!({"number": 12.5})).unwrap().number, Some(12.5));
        assert_eq!(probe(json!({"number": "12,5"})).unwrap().number, Some(12.5));
        assert_eq!(probe(json!({"number": " 7 "})).unwrap().number, Some(7.0));
        assert_eq!(probe(json!({"number": ""})).unwrap().number, None);
    }

    #[test]
    fn number_rejects_garbage() {
        assert!(probe(json!({"number": "doce"})).is_err());
        assert!(probe(json!({"number": "NaN"})).is_err());
        assert!(probe(json!({"number": false})).is_err());
    }

    #[test]
    fn same_text_ignores_blank_and_padding() {
        assert!(same_text(Some(" a "), Some("a")));
        assert!(same_text(Some(""), None));
        assert!(!same_text(Some("a"), Some("b")));
        assert!(!same_text(None, Some("b")));
    }
}

//! Lenient JSON decoding of caller-supplied parameter values.

use serde_json::Value;

/// Outcome of decoding a parameter that may carry JSON text.
#[derive(Debug)]
pub enum JsonParam {
    /// Parameter missing, or not a string.
    Absent,
    Parsed(Value),
    Malformed(serde_json::Error),
}

impl JsonParam {
    /// Decode `value` when it is a JSON string. Non-string values are reported as absent;
    /// callers that accept structured values inspect them before calling this.
    pub fn decode(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(text)) => match serde_json::from_str(text) {
                Ok(v) => JsonParam::Parsed(v),
                Err(e) => JsonParam::Malformed(e),
            },
            _ => JsonParam::Absent,
        }
    }

    /// Parsed value, treating malformed input as absent. `param` names the source for the log.
    pub fn or_absent(self, param: &str) -> Option<Value> {
        match self {
            JsonParam::Parsed(v) => Some(v),
            JsonParam::Absent => None,
            JsonParam::Malformed(e) => {
                tracing::warn!(param, error = %e, "ignoring malformed JSON parameter");
                None
            }
        }
    }
}

/// Positive integer from a number or numeric string; anything else is `None`.
pub(crate) fn positive_limit(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f > 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(n).ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_distinguishes_three_outcomes() {
        assert!(matches!(JsonParam::decode(None), JsonParam::Absent));
        assert!(matches!(JsonParam::decode(Some(&json!(5))), JsonParam::Absent));
        assert!(matches!(
            JsonParam::decode(Some(&json!("{\"a\":1}"))),
            JsonParam::Parsed(v) if v == json!({"a": 1})
        ));
        assert!(matches!(JsonParam::decode(Some(&json!("{a:1"))), JsonParam::Malformed(_)));
    }

    #[test]
    fn malformed_degrades_to_absent() {
        assert_eq!(JsonParam::decode(Some(&json!("nope"))).or_absent("where"), None);
    }

    #[test]
    fn positive_limit_rejects_zero_negative_and_text() {
        assert_eq!(positive_limit(&json!(12)), Some(12));
        assert_eq!(positive_limit(&json!("40")), Some(40));
        assert_eq!(positive_limit(&json!(0)), None);
        assert_eq!(positive_limit(&json!(-3)), None);
        assert_eq!(positive_limit(&json!("ten")), None);
        assert_eq!(positive_limit(&json!(2.5)), None);
    }
}

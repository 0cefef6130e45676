//! Field access on loosely-keyed JSON objects.
//!
//! The sources spell the same logical field several ways. Each logical field
//! gets an ordered candidate list; the first candidate holding a non-empty
//! value wins.

use serde_json::Value;

/// First candidate holding a non-blank string (numbers are stringified).
pub fn first_str(obj: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First candidate holding a number or a numeric string.
pub fn first_f64(obj: &Value, candidates: &[&str]) -> Option<f64> {
    candidates.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// First candidate holding a non-negative integer, accepting float text.
pub fn first_u64(obj: &Value, candidates: &[&str]) -> Option<u64> {
    candidates.iter().find_map(|key| match obj.get(*key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(float_to_u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_u64))
        }
        _ => None,
    })
}

fn float_to_u64(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0).then(|| v.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_non_empty_candidate_wins() {
        let obj = json!({"Title": "", "title": "平安银行发布年报", "ShowTime": null});
        assert_eq!(
            first_str(&obj, &["Title", "title"]).as_deref(),
            Some("平安银行发布年报")
        );
        assert_eq!(first_str(&obj, &["ShowTime", "showtime"]), None);
    }

    #[test]
    fn numbers_accepted_as_text_or_json() {
        let obj = json!({"close": "10.52", "open": 10.1, "volume": "123456700", "amount": "1.5e3"});
        assert_eq!(first_f64(&obj, &["close"]), Some(10.52));
        assert_eq!(first_f64(&obj, &["open"]), Some(10.1));
        assert_eq!(first_u64(&obj, &["volume"]), Some(123_456_700));
        assert_eq!(first_u64(&obj, &["amount"]), Some(1500));
        assert_eq!(first_f64(&obj, &["high"]), None);
    }
}

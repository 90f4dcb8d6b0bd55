use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// One schema-less entry of a collection.
pub type Record = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";

/// Integer id of a record. Whole floats such as `2.0` count; `2.5`, strings and huge values do not.
pub fn record_id(record: &Record) -> Option<i64> {
    let id = record.get(ID_FIELD)?;
    id.as_i64().or_else(|| {
        id.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2025-03-01T08:15:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Overlays the top-level keys of `patch` onto `base`. Nested values are replaced, not combined.
/// Keys listed in `immutable` are left as they are in `base`.
pub fn shallow_merge(base: &Record, patch: &Record, immutable: &[&str]) -> Record {
    let mut out = base.clone();
    for (k, v) in patch {
        if immutable.contains(&k.as_str()) {
            continue;
        }
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Leading-integer parse of a route id: `"12"` and `"12abc"` give 12, `"abc"` gives None.
pub fn parse_id_param(raw: &str) -> Option<i64> {
    let t = raw.trim_start();
    let (sign, digits) = match t.as_bytes().first() {
        Some(b'-') => (-1, &t[1..]),
        Some(b'+') => (1, &t[1..]),
        _ => (1, t),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

//! Form field collection and the coercions applied before a payload is sent.
//!
//! The numeric coercions follow JavaScript `parseFloat` / `parseInt(s, 10)`
//! so the server sees the same values the browser panel would send: the
//! longest numeric prefix wins and anything without one is `NaN`, which
//! serializes as JSON `null`.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use log::warn;
use serde_json::Value;

use crate::error::{AdminError, Result};

/// Largest integer a JSON consumer can hold exactly in a double.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Named form fields. A repeated name overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Raw value, empty strings included
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value only when present and non-empty
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Parse a `name=value` assignment as given on the command line
    pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
        match raw.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
            _ => Err(AdminError::Coercion(format!(
                "expected name=value, got '{}'",
                raw
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (name, value) in iter {
            form.insert(name, value);
        }
        form
    }
}

fn trim_js_whitespace(input: &str) -> &str {
    input.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn split_sign(s: &str) -> (&str, &str) {
    match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    }
}

fn leading_digits(s: &str) -> &str {
    let end = s.bytes().take_while(u8::is_ascii_digit).count();
    &s[..end]
}

/// `parseFloat`: longest decimal prefix, `Infinity` accepted, otherwise NaN
pub fn parse_float(input: &str) -> f64 {
    let (sign, rest) = split_sign(trim_js_whitespace(input));

    if rest.starts_with("Infinity") {
        return if sign == "-" {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_part = leading_digits(rest);
    let mut tail = &rest[int_part.len()..];

    let mut frac_part = "";
    if let Some(after_dot) = tail.strip_prefix('.') {
        frac_part = leading_digits(after_dot);
        if !frac_part.is_empty() {
            tail = &after_dot[frac_part.len()..];
        }
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return f64::NAN;
    }

    let mut exponent = String::new();
    if let Some(after_e) = tail.strip_prefix(['e', 'E']) {
        let (exp_sign, exp_rest) = split_sign(after_e);
        let exp_digits = leading_digits(exp_rest);
        if !exp_digits.is_empty() {
            exponent = format!("e{}{}", exp_sign, exp_digits);
        }
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let literal = if frac_part.is_empty() {
        format!("{}{}{}", sign, int_part, exponent)
    } else {
        format!("{}{}.{}{}", sign, int_part, frac_part, exponent)
    };
    literal.parse::<f64>().unwrap_or(f64::NAN)
}

/// `parseInt(s, 10)`: longest run of decimal digits after an optional sign
pub fn parse_int(input: &str) -> f64 {
    let (sign, rest) = split_sign(trim_js_whitespace(input));
    let digits = leading_digits(rest);
    if digits.is_empty() {
        return f64::NAN;
    }
    format!("{}{}", sign, digits).parse::<f64>().unwrap_or(f64::NAN)
}

/// Only a case-insensitive `"true"` is true
pub fn parse_bool(input: &str) -> bool {
    input.to_lowercase() == "true"
}

/// JSON form of a coerced number: NaN and infinities become `null`,
/// integral values become JSON integers.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Integer value for a path segment; NaN is rejected
pub fn required_id(form: &FormData, name: &str) -> Result<i64> {
    let raw = form.get(name).unwrap_or_default();
    let n = parse_int(raw);
    if n.is_nan() || n.abs() > MAX_SAFE_INTEGER {
        return Err(AdminError::Coercion(format!(
            "{} must be an integer, got '{}'",
            name, raw
        )));
    }
    Ok(n as i64)
}

fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Convert a `datetime-local` style input read in `tz` into a UTC ISO-8601 instant
pub fn to_utc_iso_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<String> {
    let s = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(format_utc(instant.with_timezone(&Utc)));
    }

    // Date-only forms are UTC midnight, not local midnight
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(format_utc(midnight.and_utc()));
        }
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            // A wall time skipped by a DST jump moves forward past the gap
            let resolved = match tz.from_local_datetime(&naive) {
                LocalResult::None => tz.from_local_datetime(&(naive + TimeDelta::hours(1))),
                resolved => resolved,
            };
            let local = resolved.earliest().ok_or_else(|| {
                AdminError::Coercion(format!("time '{}' does not exist in the local time zone", s))
            })?;
            return Ok(format_utc(local.with_timezone(&Utc)));
        }
    }

    Err(AdminError::Coercion(format!("invalid time value '{}'", s)))
}

/// Convert a `datetime-local` style input read in the machine's time zone
pub fn to_utc_iso(input: &str) -> Result<String> {
    to_utc_iso_in(input, &Local)
}

/// Parse the free-text items field. Blank or malformed input yields `[]`.
pub fn parse_items(raw: Option<&str>) -> Value {
    let text = raw.filter(|s| !s.is_empty()).unwrap_or("[]");
    serde_json::from_str(text).unwrap_or_else(|e| {
        warn!("Ignoring malformed items JSON ({}), sending an empty list", e);
        Value::Array(Vec::new())
    })
}

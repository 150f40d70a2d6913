use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// The API's placeholder for a value it does not have.
pub const NOT_AVAILABLE: &str = "N/A";

/// Numbers scraped from the API lose their unit once `$`, `%` and `,` are stripped; the caller
/// knows from the field whether it is a price, a percentage or a plain count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Decimal(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Integer(int) => int as f64,
            Numeric::Decimal(dec) => dec,
        }
    }

    /// Decimals are rounded to the nearest whole number.
    pub fn as_i64(self) -> i64 {
        match self {
            Numeric::Integer(int) => int,
            Numeric::Decimal(dec) => dec.round() as i64,
        }
    }
}

#[inline]
fn is_null(raw: &str) -> bool {
    raw.is_empty() || raw == NOT_AVAILABLE
}

/// `""` and `"N/A"` become `None`; anything else is returned untouched (no trimming).
pub fn normalize_string(raw: &str) -> Option<String> {
    if is_null(raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Dates come in two shapes:
///
/// ```text
/// "Jan 05, 2024"  (whenever a comma is present)
/// "01/05/2024"
/// ```
///
/// A string matching neither logs a warning and returns `None`.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    if is_null(raw) {
        return None;
    }

    let fmt = if raw.contains(',') { "%b %d, %Y" } else { "%m/%d/%Y" };
    match NaiveDate::parse_from_str(raw, fmt) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("failed to parse date \"{raw}\" with format \"{fmt}\", error({err})");
            None
        }
    }
}

/// Strip `%`, `$` and `,` then parse; a remaining `.` means a decimal, otherwise an integer.
///
/// ```text
/// "$1,234.50" -> Decimal(1234.5)
/// "12,345"    -> Integer(12345)
/// "65.02%"    -> Decimal(65.02)
/// ```
pub fn normalize_numeric(raw: &str) -> Option<Numeric> {
    if is_null(raw) {
        return None;
    }

    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '%' | '$' | ','))
        .collect();

    let parsed = if stripped.contains('.') {
        stripped.parse::<f64>().map(Numeric::Decimal).ok()
    } else {
        stripped.parse::<i64>().map(Numeric::Integer).ok()
    };

    if parsed.is_none() {
        warn!("failed to parse numeric value \"{raw}\"");
    }
    parsed
}

/// Listing flags arrive either as JSON booleans or as "Yes"/"No" strings.
pub fn normalize_flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" => Some(true),
            "no" | "false" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// trimmed shortcuts for the fetchers; the API pads some fields with whitespace
pub(crate) fn string_field(raw: Option<&str>) -> Option<String> {
    raw.and_then(|s| normalize_string(s.trim()))
}

pub(crate) fn date_field(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| normalize_date(s.trim()))
}

pub(crate) fn numeric_field(raw: Option<&str>) -> Option<Numeric> {
    raw.and_then(|s| normalize_numeric(s.trim()))
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

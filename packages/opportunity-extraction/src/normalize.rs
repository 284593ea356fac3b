//! Field-level normalization shared by every backend.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::NOT_AVAILABLE;

static RE_TRAILING_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s*\b(?:united states of america|united states|u\.s\.a\.?|usa|u\.s\.?|us)\.?$")
        .unwrap()
});

/// A ZIP only counts when it follows a two-letter state code.
static RE_TRAILING_ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2})\.?,?\s+\d{5}(?:-\d{4})?$").unwrap());

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

static RE_PHONE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,;/]|\bor\b|\bext\.?\b|\bx\b").unwrap());

/// Collapse every whitespace run to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Empty, `n/a`, `na` or `none` (any case).
pub fn is_not_available(s: &str) -> bool {
    let t = s.trim().to_ascii_lowercase();
    t.is_empty() || matches!(t.as_str(), "n/a" | "na" | "none")
}

/// Generic string field: collapsed, or the `N/A` sentinel.
pub fn scalar(s: &str) -> String {
    let collapsed = collapse_whitespace(s);
    if is_not_available(&collapsed) {
        NOT_AVAILABLE.to_string()
    } else {
        collapsed
    }
}

/// Comparison key for vocabulary matching.
pub(crate) fn vocabulary_key(s: &str) -> String {
    collapse_whitespace(&s.to_lowercase().replace(['_', '-'], " "))
}

/// Strip trailing country names and ZIP codes from an address.
pub fn location(s: &str) -> String {
    let mut value = scalar(s);
    if value == NOT_AVAILABLE {
        return value;
    }

    loop {
        let before = value.len();
        value = RE_TRAILING_COUNTRY.replace(&value, "").into_owned();
        value = RE_TRAILING_ZIP.replace(&value, "$1").into_owned();
        value = value.trim_end_matches([',', ' ']).to_string();
        if value.len() == before {
            break;
        }
    }

    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

/// `flexible`, `fl` and `drop-in` all mean "Fl".
pub fn time_slot(s: &str) -> String {
    let value = scalar(s);
    match vocabulary_key(&value).as_str() {
        "fl" | "flexible" | "drop in" | "dropin" => "Fl".to_string(),
        _ => value,
    }
}

/// First address in `s`, lowercased and without `mailto:`, or `N/A`.
///
/// Labels and further addresses around it are dropped.
pub fn email(s: &str) -> String {
    let value = scalar(s);
    if value == NOT_AVAILABLE {
        return value;
    }

    let lower = value.to_lowercase();
    lower
        .split(|c: char| c.is_whitespace() || ",;<>()[]\"'".contains(c))
        .map(|token| {
            let token = token.strip_prefix("mailto:").unwrap_or(token);
            token.trim_end_matches(['.', ':'])
        })
        .find(|token| RE_EMAIL.is_match(token))
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Digits of the first phone number in `s`.
///
/// `Ok(None)` when there is no number at all.
pub fn phone_digits(s: &str) -> Result<Option<i64>, String> {
    if is_not_available(s) {
        return Ok(None);
    }

    let first = RE_PHONE_SEPARATOR.split(s).next().unwrap_or_default();
    let digits: String = first.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(None);
    }

    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("contact_number `{}` is too long", s.trim()))
}

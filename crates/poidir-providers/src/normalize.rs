//! Helpers that turn loosely-structured vendor fields into [`PlaceRecord`]
//! parts.
//!
//! [`PlaceRecord`]: poidir_core::PlaceRecord

use std::sync::LazyLock;

use poidir_core::Address;
use regex::Regex;

static COUNTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").expect("valid regex"));

/// Trims and drops empty strings.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Joins the non-empty parts with a single space.
pub(crate) fn join_non_empty<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a single-line address such as
/// `"1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA"` into parts.
///
/// The last comma part is taken as the country only when it is purely
/// alphabetic; the part before it (or the last part) is split into state and
/// the last digit-bearing token as zip.
pub(crate) fn parse_formatted_address(formatted: Option<&str>) -> Address {
    let Some(formatted) = formatted.map(str::trim).filter(|f| !f.is_empty()) else {
        return Address::default();
    };

    let parts: Vec<&str> = formatted.split(',').map(str::trim).collect();
    let street = parts.first().copied().unwrap_or(formatted).to_string();
    let city = parts.get(1).copied().unwrap_or_default().to_string();

    let country = match parts.last() {
        Some(last) if parts.len() > 2 && COUNTRY_RE.is_match(last) => (*last).to_string(),
        _ => String::new(),
    };

    let mut state = String::new();
    let mut zip = String::new();
    if parts.len() > 2 {
        let state_zip = if country.is_empty() {
            parts[parts.len() - 1]
        } else {
            parts[parts.len() - 2]
        };
        let tokens: Vec<&str> = state_zip.split_whitespace().collect();
        if let Some(found) = tokens
            .iter()
            .rev()
            .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        {
            zip = (*found).to_string();
        }
        state = tokens
            .iter()
            .filter(|t| **t != zip)
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
    }

    Address {
        street,
        city,
        state,
        zip,
        country,
    }
}

/// Formats North-American numbers as `(AAA) BBB-CCCC`; anything else is
/// returned unchanged.
pub(crate) fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let local = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return phone.to_string(),
    };
    format!("({}) {}-{}", &local[..3], &local[3..6], &local[6..])
}

/// Splits an OSM-style `opening_hours` value into display lines.
pub(crate) fn split_opening_hours(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Trims, drops blanks, and removes duplicates while keeping first-seen order.
pub(crate) fn dedupe_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in lines.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
        if !out.iter().any(|seen| seen == line) {
            out.push(line.to_string());
        }
    }
    out
}

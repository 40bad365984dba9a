use serde::{Deserialize, Serialize};
use std::fmt;

/// A city as stored on a ride path.
///
/// The stored string is the display form ("Paris", "Aéroport de madrid").
/// The comparison key is derived from it on demand, so both views always
/// come from the same canonical value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityName(String);

impl CityName {
    /// Builds a city from raw user input. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(format_display(trimmed)))
    }

    /// Display form: first character upper-cased, the rest lower-cased.
    pub fn display(&self) -> &str {
        &self.0
    }

    /// Comparison key: trimmed and lower-cased.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive match against raw input.
    pub fn matches(&self, raw: &str) -> bool {
        normalize_city(raw).is_some_and(|key| key == self.key())
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Comparison form of raw input; blank becomes `None`.
pub fn normalize_city(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn format_display(trimmed: &str) -> String {
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

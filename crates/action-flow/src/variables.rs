//! `{{ name }}` placeholder substitution with deterministic fallbacks

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Canned values for unbound variables, in lookup order.
pub const DUMMY_VALUES: [(&str, &str); 15] = [
    ("email", "test@example.com"),
    ("username", "testuser"),
    ("password", "TestPass123!"),
    ("name", "Test User"),
    ("first_name", "Test"),
    ("last_name", "User"),
    ("phone", "555-0100"),
    ("address", "123 Test Street"),
    ("city", "Testville"),
    ("zip", "12345"),
    ("country", "United States"),
    ("search", "test query"),
    ("url", "https://example.com"),
    ("message", "This is a test message."),
    ("comment", "This is a test comment."),
];

/// Substituted text plus the names that fell back to dummy values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub value: String,
    pub dummies: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VariableResolver;

impl VariableResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn has_placeholders(template: &str) -> bool {
        PLACEHOLDER.is_match(template)
    }

    /// Replace every placeholder. Bound names substitute verbatim; unbound
    /// names get a dummy and are reported once, in first-seen order.
    pub fn resolve(&self, template: &str, variables: &HashMap<String, String>) -> Resolution {
        let mut dummies: Vec<String> = Vec::new();
        let value = PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let name = &caps[1];
                if let Some(bound) = variables.get(name) {
                    return bound.clone();
                }
                if !dummies.iter().any(|d| d == name) {
                    dummies.push(name.to_string());
                }
                Self::dummy_value(name)
            })
            .into_owned();
        Resolution { value, dummies }
    }

    /// Exact dictionary hit, else the first entry whose key and the name
    /// contain one another, else `dummy_<name>`.
    pub fn dummy_value(name: &str) -> String {
        let lower = name.to_ascii_lowercase();
        if let Some((_, value)) = DUMMY_VALUES.iter().find(|(key, _)| *key == lower) {
            return (*value).to_string();
        }
        if let Some((_, value)) = DUMMY_VALUES
            .iter()
            .find(|(key, _)| lower.contains(key) || key.contains(lower.as_str()))
        {
            return (*value).to_string();
        }
        format!("dummy_{}", name)
    }
}

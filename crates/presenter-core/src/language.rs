//! Language maps and metadata pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Localized multi-value string container: `{"en": ["value", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageMap(BTreeMap<String, Vec<String>>);

impl LanguageMap {
    /// A map with one language and the given values.
    pub fn new<I, S>(language: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        map.insert(
            language.to_string(),
            values.into_iter().map(Into::into).collect(),
        );
        Self(map)
    }

    /// A map with one language and one value.
    pub fn single(language: &str, value: impl Into<String>) -> Self {
        Self::new(language, [value.into()])
    }

    /// Values for `language`, empty if absent.
    pub fn values(&self, language: &str) -> &[String] {
        self.0.get(language).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first value of any language, preferring `none` last.
    pub fn first(&self) -> Option<&str> {
        self.0
            .iter()
            .filter(|(lang, _)| lang.as_str() != "none")
            .chain(self.0.iter().filter(|(lang, _)| lang.as_str() == "none"))
            .find_map(|(_, values)| values.first().map(String::as_str))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// True when any value, lowercased, contains `needle`.
    pub fn any_value_contains(&self, needle: &str) -> bool {
        self.0
            .values()
            .flatten()
            .any(|v| v.to_lowercase().contains(needle))
    }

    /// Union `other` into `self` per language, first-seen order, no duplicates.
    pub fn merge_union(&mut self, other: &LanguageMap) {
        for (lang, values) in &other.0 {
            let existing = self.0.entry(lang.clone()).or_default();
            for value in values {
                if !existing.contains(value) {
                    existing.push(value.clone());
                }
            }
        }
    }
}

/// A `{label, value}` pair in the descriptor's metadata list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: LanguageMap,
    pub value: LanguageMap,
}

impl MetadataEntry {
    pub fn new(language: &str, label: &str, values: Vec<String>) -> Self {
        Self {
            label: LanguageMap::single(language, label),
            value: LanguageMap::new(language, values),
        }
    }

    /// Whether any label value equals `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.label.0.values().flatten().any(|v| v == label)
    }
}

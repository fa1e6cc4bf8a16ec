use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Code used when a language name is not in the table.
pub const FALLBACK_CODE: &str = "en";

const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Spanish", "es"),
    ("French", "fr"),
    ("German", "de"),
    ("Italian", "it"),
    ("Portuguese", "pt"),
    ("Russian", "ru"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Chinese (Simplified)", "zh-CN"),
    ("Chinese (Traditional)", "zh-TW"),
    ("Arabic", "ar"),
    ("Hindi", "hi"),
    ("Dutch", "nl"),
    ("Polish", "pl"),
    ("Turkish", "tr"),
    ("Vietnamese", "vi"),
    ("Thai", "th"),
    ("Indonesian", "id"),
    ("Swedish", "sv"),
];

/// Closed mapping from human-readable language names to translation codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable(BTreeMap<String, String>);

impl Default for LanguageTable {
    fn default() -> Self {
        DEFAULT_LANGUAGES
            .iter()
            .map(|(name, code)| (name.to_string(), code.to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for LanguageTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl LanguageTable {
    /// Code for `name` (case-insensitive), or English when the name is unknown.
    pub fn code_for(&self, name: &str) -> &str {
        self.lookup(name).unwrap_or(FALLBACK_CODE)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.0
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, code)| code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_for_known_names() {
        let table = LanguageTable::default();
        assert_eq!(table.code_for("Spanish"), "es");
        assert_eq!(table.code_for("  japanese "), "ja");
        assert_eq!(table.code_for("CHINESE (TRADITIONAL)"), "zh-TW");
    }

    #[test]
    fn test_unknown_name_falls_back_to_english() {
        let table = LanguageTable::default();
        assert_eq!(table.code_for("Elvish"), "en");
        assert_eq!(table.code_for(""), "en");
        assert!(!table.contains("Elvish"));
    }

    #[test]
    fn test_names_are_listed() {
        let table = LanguageTable::default();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names.len(), DEFAULT_LANGUAGES.len());
        assert!(names.contains(&"Korean"));
    }
}

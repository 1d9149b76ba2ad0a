//! Section/key source format.
//!
//! ```text
//! # comment
//! [app]
//! environment = development
//! name = "Example App"
//! ```
//!
//! Section and key names are case-insensitive. Values keep their case and
//! lose one pair of surrounding quotes. The last occurrence of a key wins.

use std::collections::BTreeMap;

/// Parsed source: section name → key → raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Source {
    /// Parse source text. Unparseable lines are skipped, never fatal.
    pub fn parse(content: &str) -> Self {
        let mut source = Source::default();
        let mut current: Option<String> = None;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_ascii_lowercase();
                source.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!(line = line_num + 1, "Skipping line without '='");
                continue;
            };

            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                tracing::debug!(line = line_num + 1, "Skipping empty key");
                continue;
            }

            let Some(section) = current.as_ref() else {
                tracing::debug!(line = line_num + 1, key = %key, "Skipping key outside any section");
                continue;
            };

            source
                .sections
                .entry(section.clone())
                .or_default()
                .insert(key, unquote(value.trim()).to_string());
        }

        source
    }

    /// Raw value for `section.key`, if present.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    /// Iterate over every `(section, key)` pair present.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().flat_map(|(section, keys)| {
            keys.keys().map(move |key| (section.as_str(), key.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));

    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_and_keys() {
        let source = Source::parse(
            "[app]\nenvironment = development\nname = ExampleApp\n\n[api]\nbase_url = https://example.com/api\ntimeout = 30\n",
        );

        assert_eq!(source.get("app", "environment"), Some("development"));
        assert_eq!(source.get("app", "name"), Some("ExampleApp"));
        assert_eq!(source.get("api", "base_url"), Some("https://example.com/api"));
        assert_eq!(source.get("api", "timeout"), Some("30"));
        assert_eq!(source.get("api", "missing"), None);
    }

    #[test]
    fn test_comments_and_junk_are_skipped() {
        let source = Source::parse(
            "# leading comment\norphan = 1\n[window]\n; another comment\nnot a pair\nwidth = 900\n = 3\n",
        );

        assert_eq!(source.get("window", "width"), Some("900"));
        assert_eq!(source.keys().count(), 1);
    }

    #[test]
    fn test_names_are_case_insensitive_values_are_not() {
        let source = Source::parse("[App]\nName = MixedCase\n");
        assert_eq!(source.get("app", "name"), Some("MixedCase"));
    }

    #[test]
    fn test_quotes_stripped_once() {
        let source = Source::parse("[app]\nname = \"Quoted App\"\nversion = '1.2.3'\nlone = \"\n");
        assert_eq!(source.get("app", "name"), Some("Quoted App"));
        assert_eq!(source.get("app", "version"), Some("1.2.3"));
        assert_eq!(source.get("app", "lone"), Some("\""));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let source = Source::parse("[log]\nlevel = info\n[log]\nlevel = warn\n");
        assert_eq!(source.get("log", "level"), Some("warn"));
    }

    #[test]
    fn test_empty_source() {
        assert!(Source::parse("").is_empty());
        assert!(Source::parse("[app]\n").is_empty());
    }
}

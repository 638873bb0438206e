//! Text matching of free-text log values against dimension attributes.

use std::collections::HashMap;

use lakestar_config::shared::TextMatchMode;

/// Result of looking up a probe in a [`TextMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No candidate matched.
    Unmatched,
    /// Exactly one candidate matched.
    Unique(usize),
    /// Several candidates matched; `index` is the first in candidate order.
    Ambiguous { index: usize, candidates: usize },
}

impl MatchOutcome {
    /// Returns the index of the winning candidate, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            MatchOutcome::Unmatched => None,
            MatchOutcome::Unique(index) | MatchOutcome::Ambiguous { index, .. } => Some(*index),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MatchOutcome::Ambiguous { .. })
    }
}

/// Matches free text from the logs against the text key of a dimension.
///
/// Candidates keep the order they were given in and the first matching one wins. Equality
/// modes are served from a hash index; prefix and substring modes scan the candidates.
#[derive(Debug)]
pub struct TextMatcher {
    mode: TextMatchMode,
    keys: Vec<Option<String>>,
    index: HashMap<String, Vec<usize>>,
}

impl TextMatcher {
    /// Builds a matcher over candidate keys; `None` keys never match.
    pub fn new<'a>(mode: TextMatchMode, keys: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let keys: Vec<Option<String>> = keys
            .into_iter()
            .map(|key| key.map(|key| normalize(mode, key)))
            .collect();

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        if mode.is_equality() {
            for (position, key) in keys.iter().enumerate() {
                if let Some(key) = key {
                    index.entry(key.clone()).or_default().push(position);
                }
            }
        }

        Self { mode, keys, index }
    }

    pub fn mode(&self) -> TextMatchMode {
        self.mode
    }

    /// Looks up `probe` among the candidates.
    ///
    /// An empty probe never matches.
    pub fn find(&self, probe: &str) -> MatchOutcome {
        if probe.is_empty() {
            return MatchOutcome::Unmatched;
        }

        let probe = normalize(self.mode, probe);
        match self.mode {
            TextMatchMode::Exact | TextMatchMode::CaseInsensitive => self
                .index
                .get(&probe)
                .map(|positions| outcome(positions.first().copied(), positions.len()))
                .unwrap_or(MatchOutcome::Unmatched),
            TextMatchMode::Prefix => self.scan(|key| key.starts_with(probe.as_str())),
            TextMatchMode::Substring => self.scan(|key| key.contains(probe.as_str())),
        }
    }

    fn scan(&self, matches: impl Fn(&str) -> bool) -> MatchOutcome {
        let mut first = None;
        let mut count = 0;
        for (position, key) in self.keys.iter().enumerate() {
            if key.as_deref().is_some_and(&matches) {
                first.get_or_insert(position);
                count += 1;
            }
        }

        outcome(first, count)
    }
}

fn outcome(first: Option<usize>, count: usize) -> MatchOutcome {
    match first {
        None => MatchOutcome::Unmatched,
        Some(index) if count == 1 => MatchOutcome::Unique(index),
        Some(index) => MatchOutcome::Ambiguous {
            index,
            candidates: count,
        },
    }
}

fn normalize(mode: TextMatchMode, value: &str) -> String {
    match mode {
        TextMatchMode::Exact => value.to_string(),
        TextMatchMode::CaseInsensitive | TextMatchMode::Prefix | TextMatchMode::Substring => {
            value.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [Option<&str>; 4] = [
        Some("The Black Keys"),
        Some("the black keys"),
        None,
        Some("Black Sabbath"),
    ];

    #[test]
    fn exact_mode_respects_case() {
        let matcher = TextMatcher::new(TextMatchMode::Exact, NAMES);

        assert_eq!(matcher.find("the black keys"), MatchOutcome::Unique(1));
        assert_eq!(matcher.find("THE BLACK KEYS"), MatchOutcome::Unmatched);
    }

    #[test]
    fn case_insensitive_mode_reports_ambiguity_and_keeps_first() {
        let matcher = TextMatcher::new(TextMatchMode::CaseInsensitive, NAMES);

        let outcome = matcher.find("THE BLACK KEYS");
        assert_eq!(
            outcome,
            MatchOutcome::Ambiguous {
                index: 0,
                candidates: 2
            }
        );
        assert_eq!(outcome.index(), Some(0));
        assert_eq!(matcher.find("black sabbath"), MatchOutcome::Unique(3));
    }

    #[test]
    fn prefix_and_substring_modes_scan_candidates() {
        let prefix = TextMatcher::new(TextMatchMode::Prefix, NAMES);
        assert_eq!(prefix.find("black"), MatchOutcome::Unique(3));

        let substring = TextMatcher::new(TextMatchMode::Substring, NAMES);
        assert_eq!(
            substring.find("BLACK"),
            MatchOutcome::Ambiguous {
                index: 0,
                candidates: 3
            }
        );
    }

    #[test]
    fn empty_probe_never_matches() {
        let matcher = TextMatcher::new(TextMatchMode::Substring, NAMES);

        assert_eq!(matcher.find(""), MatchOutcome::Unmatched);
    }
}

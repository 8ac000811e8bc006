//! QuestionSet - ordered clarification questions and their extraction from
//! free-form model output

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use tracing::{debug, warn};

/// Object inside a fenced block, labelled `json` or not
const FENCE_PATTERN: &str = r"(?s)```(?:json)?\s*(\{.*?\})\s*```";

/// Widest brace span anywhere in the text
const BRACE_PATTERN: &str = r"(?s)(\{.*\})";

/// Asked when the model's questions cannot be extracted
const DEFAULT_QUESTIONS: &[(&str, &str)] = &[
    ("target_platform", "What are your target platforms/environments?"),
    ("timeline", "What is your expected timeline for this project?"),
    ("team_size", "What is your team size and composition?"),
    ("must_have_features", "What features do you consider must-haves for your MVP?"),
    ("tech_stack", "Do you have preferred technologies or frameworks?"),
    ("budget", "Do you have budget constraints that would impact the roadmap?"),
    ("prior_experience", "What is your team's prior experience with similar projects?"),
    ("deployment", "What are your deployment or distribution requirements?"),
    ("scaling", "What are your scaling expectations (users, data volume, etc.)?"),
    ("integration", "Are there existing systems you need to integrate with?"),
];

/// One clarification question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub key: String,
    pub text: String,
}

/// Ordered key -> question mapping with unique keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
    fallback: bool,
}

impl QuestionSet {
    /// Build from ordered pairs; blank entries are dropped and the first
    /// occurrence of a key wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut questions: Vec<Question> = Vec::new();
        for (key, text) in pairs {
            let key = key.into().trim().to_string();
            let text = text.into().trim().to_string();
            if key.is_empty() || text.is_empty() {
                debug!(%key, "QuestionSet::from_pairs: skipping blank entry");
                continue;
            }
            if questions.iter().any(|q| q.key == key) {
                debug!(%key, "QuestionSet::from_pairs: duplicate key, keeping first");
                continue;
            }
            questions.push(Question { key, text });
        }
        Self {
            questions,
            fallback: false,
        }
    }

    /// The ten generic questions
    pub fn defaults() -> Self {
        let mut set = Self::from_pairs(DEFAULT_QUESTIONS.iter().copied());
        set.fallback = true;
        set
    }

    /// Extract questions from model output, falling back to the defaults
    pub fn parse(text: &str) -> Self {
        debug!(len = text.len(), "QuestionSet::parse: called");
        match Self::try_parse(text) {
            Some(set) => {
                debug!(count = set.len(), "QuestionSet::parse: extracted questions");
                set
            }
            None => {
                warn!("Could not extract questions from model output, using default questions");
                Self::defaults()
            }
        }
    }

    /// Strict extraction; `None` when nothing usable was found
    pub fn try_parse(text: &str) -> Option<Self> {
        debug!("QuestionSet::try_parse: called");
        for pattern in [FENCE_PATTERN, BRACE_PATTERN] {
            if let Some(block) = extract_block(pattern, text)
                && let Some(set) = parse_object(block)
            {
                debug!(%pattern, "QuestionSet::try_parse: parsed embedded block");
                return Some(set);
            }
        }
        debug!("QuestionSet::try_parse: trying whole response");
        parse_object(text.trim())
    }

    /// True when this is the default set substituted for unusable output
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.key.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.questions.iter().any(|q| q.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.questions.iter().find(|q| q.key == key).map(|q| q.text.as_str())
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

fn extract_block<'t>(pattern: &str, text: &'t str) -> Option<&'t str> {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, "extract_block: pattern failed to compile");
            return None;
        }
    };
    re.captures(text)?.get(1).map(|m| m.as_str())
}

fn parse_object(json: &str) -> Option<QuestionSet> {
    match serde_json::from_str::<OrderedEntries>(json) {
        Ok(OrderedEntries(pairs)) => {
            let set = QuestionSet::from_pairs(pairs);
            if set.is_empty() {
                debug!("parse_object: object had no usable questions");
                None
            } else {
                Some(set)
            }
        }
        Err(e) => {
            debug!(error = %e, "parse_object: not a string-valued object");
            None
        }
    }
}

/// A JSON object read in document order with string values only
struct OrderedEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping question keys to question text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, text)) = map.next_entry::<String, String>()? {
                    entries.push((key, text));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(set: &QuestionSet) -> Vec<&str> {
        set.keys().collect()
    }

    #[test]
    fn test_fenced_json_block() {
        let text = "Here you go:\n```json\n{\n  \"platform\": \"Which platforms?\",\n  \"audience\": \"Who is it for?\"\n}\n```\nThanks";
        let set = QuestionSet::parse(text);
        assert!(!set.is_fallback());
        assert_eq!(keys(&set), vec!["platform", "audience"]);
        assert_eq!(set.get("audience"), Some("Who is it for?"));
    }

    #[test]
    fn test_unlabelled_fence() {
        let set = QuestionSet::parse("```\n{\"a\": \"A?\"}\n```");
        assert_eq!(keys(&set), vec!["a"]);
    }

    #[test]
    fn test_bare_object_with_prose() {
        let set = QuestionSet::parse("Sure. {\"zeta\": \"Z?\", \"alpha\": \"A?\"} Hope that helps.");
        // Document order, not sorted
        assert_eq!(keys(&set), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_fence_wins_over_earlier_prose_braces() {
        let set = QuestionSet::parse("Set {x} aside.\n```json\n{\"a\": \"A?\", \"b\": \"B?\"}\n```");
        assert!(!set.is_fallback());
        assert_eq!(keys(&set), vec!["a", "b"]);
    }

    #[test]
    fn test_fence_without_object_falls_through_to_brace_span() {
        let set = QuestionSet::parse("```\nnot json\n```\n{\"k\": \"K?\"}");
        assert_eq!(keys(&set), vec!["k"]);
    }

    #[test]
    fn test_whole_response_json() {
        let set = QuestionSet::try_parse("  {\"k\": \"v?\"}  ").unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let set = QuestionSet::parse("{\"k\": \"first\", \"k\": \"second\", \"j\": \"other\"}");
        assert_eq!(set.get("k"), Some("first"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        for text in [
            "no json here at all",
            "{\"k\": 1}",
            "{}",
            "[\"a\", \"b\"]",
            "```json\n{\"broken\": \n```",
            "",
        ] {
            let set = QuestionSet::parse(text);
            assert!(set.is_fallback(), "expected fallback for {text:?}");
            assert_eq!(set.len(), 10);
        }
    }

    #[test]
    fn test_defaults_order() {
        let set = QuestionSet::defaults();
        let keys = keys(&set);
        assert_eq!(keys.first(), Some(&"target_platform"));
        assert_eq!(keys.last(), Some(&"integration"));
        assert!(set.contains_key("budget"));
    }

    #[test]
    fn test_blank_entries_dropped() {
        let set = QuestionSet::from_pairs([("a", "  "), (" ", "Q?"), ("b", "B?")]);
        assert_eq!(keys(&set), vec!["b"]);
    }
}

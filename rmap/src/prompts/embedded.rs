//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Initial roadmap prompt
pub const DRAFT: &str = include_str!("../../prompts/draft.pmt");

/// Clarifying-question prompt
pub const QUESTIONS: &str = include_str!("../../prompts/questions.pmt");

/// Refinement prompt
pub const REFINE: &str = include_str!("../../prompts/refine.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "draft" => Some(DRAFT),
        "questions" => Some(QUESTIONS),
        "refine" => Some(REFINE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_draft() {
        let draft = get_embedded("draft").unwrap();
        assert!(draft.contains("{{idea}}"));
        assert!(draft.contains("roadmap"));
    }

    #[test]
    fn test_get_embedded_questions_asks_for_json() {
        let questions = get_embedded("questions").unwrap();
        assert!(questions.contains("{{draft}}"));
        assert!(questions.contains("JSON"));
    }

    #[test]
    fn test_get_embedded_refine() {
        let refine = get_embedded("refine").unwrap();
        assert!(refine.contains("{{#each answers}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}

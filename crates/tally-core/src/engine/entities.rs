//! Entity extraction from question text
//!
//! Matching runs only against the vocabulary actually present in the
//! dataset, so a name the data has never seen cannot quietly become a
//! filter. Extraction never fails; an empty slot is a valid outcome that
//! intent resolution and dispatch deal with downstream.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Vocabulary;
use crate::month::YearMonth;

/// How an entity mention was matched.
///
/// Ordering is meaningful: `Exact` beats `Token`, and `Unknown` marks a
/// phrase that looked like an entity reference but is absent from the
/// vocabulary (the typo / wrong-dataset path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchConfidence {
    Unknown,
    Token,
    Exact,
}

/// One extracted entity candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    pub value: String,
    pub confidence: MatchConfidence,
}

/// Everything extracted from one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entities {
    pub month: Option<YearMonth>,
    pub category: Option<EntityMatch>,
    pub merchant: Option<EntityMatch>,
    pub source: Option<EntityMatch>,
}

/// Scan a question against the dataset vocabulary.
pub fn resolve(question: &str, vocab: &Vocabulary) -> Entities {
    let mut entities = Entities {
        month: extract_month(question),
        category: match_vocabulary(question, &vocab.categories),
        merchant: match_vocabulary(question, &vocab.merchants),
        source: match_vocabulary(question, &vocab.sources),
    };

    // A quoted or "at X" phrase that missed the vocabulary is still a
    // merchant reference; carry it as Unknown so dispatch can ask about
    // it instead of silently ignoring it.
    if entities.merchant.is_none() {
        if let Some(phrase) = harvest_merchant_phrase(question, vocab) {
            entities.merchant = Some(EntityMatch {
                value: phrase,
                confidence: MatchConfidence::Unknown,
            });
        }
    }

    entities
}

fn month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{2})\b").expect("static regex"))
}

fn month_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?\s+(\d{4})\b",
        )
        .expect("static regex")
    })
}

/// Extract a month from `YYYY-MM` or a "June 2025" phrase.
/// Out-of-range numeric months (e.g. `2025-13`) are ignored, not errors.
pub fn extract_month(question: &str) -> Option<YearMonth> {
    if let Some(caps) = month_pattern().captures(question) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        if let Ok(ym) = YearMonth::new(year, month) {
            return Some(ym);
        }
    }

    if let Some(caps) = month_name_pattern().captures(question) {
        let name = caps[1].to_lowercase();
        let year: i32 = caps[2].parse().ok()?;
        let month = match &name[..3] {
            "jan" => 1,
            "feb" => 2,
            "mar" => 3,
            "apr" => 4,
            "may" => 5,
            "jun" => 6,
            "jul" => 7,
            "aug" => 8,
            "sep" => 9,
            "oct" => 10,
            "nov" => 11,
            "dec" => 12,
            _ => return None,
        };
        return YearMonth::new(year, month).ok();
    }

    None
}

/// Pick the best vocabulary entry mentioned in the question.
///
/// Exact whole-phrase hits beat token-level hits; ties go to the longer
/// entry, then lexicographically, so repeat questions always resolve the
/// same way.
pub fn match_vocabulary(question: &str, entries: &[String]) -> Option<EntityMatch> {
    let question_lower = question.to_lowercase();

    let mut best: Option<(MatchConfidence, &String)> = None;
    for entry in entries {
        if entry.is_empty() {
            continue;
        }
        let entry_lower = entry.to_lowercase();

        let confidence = if phrase_present(&question_lower, &entry_lower) {
            MatchConfidence::Exact
        } else if tokens_present(&question_lower, &entry_lower) {
            MatchConfidence::Token
        } else {
            continue;
        };

        best = match best {
            None => Some((confidence, entry)),
            Some((best_conf, best_entry)) => {
                let better = confidence
                    .cmp(&best_conf)
                    .then(entry.len().cmp(&best_entry.len()))
                    .then(best_entry.cmp(entry));
                if better.is_gt() {
                    Some((confidence, entry))
                } else {
                    Some((best_conf, best_entry))
                }
            }
        };
    }

    best.map(|(confidence, entry)| EntityMatch {
        value: entry.clone(),
        confidence,
    })
}

/// Whole-phrase, word-boundary presence check (both sides lowercased).
fn phrase_present(question_lower: &str, entry_lower: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(entry_lower));
    Regex::new(&pattern)
        .map(|re| re.is_match(question_lower))
        .unwrap_or(false)
}

/// Every whitespace token of a multi-word entry appears as a word.
fn tokens_present(question_lower: &str, entry_lower: &str) -> bool {
    let tokens: Vec<&str> = entry_lower.split_whitespace().collect();
    if tokens.len() < 2 {
        return false;
    }
    tokens.iter().all(|t| phrase_present(question_lower, t))
}

fn quoted_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"))
}

fn at_on_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:at|on)\s+").expect("static regex"))
}

fn phrase_boundary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:in|for|during|this|last)\b|\d{4}-\d{2}|\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}\b")
            .expect("static regex")
    })
}

fn strip_punctuation_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static regex"))
}

/// Harvest a merchant-looking phrase: quoted text, or the words after
/// "at"/"on" up to a boundary token or month reference.
///
/// Phrases that name a known category or source are discarded; those
/// slots have their own matchers and a category name after "on"
/// ("on Food") is not a merchant.
fn harvest_merchant_phrase(question: &str, vocab: &Vocabulary) -> Option<String> {
    let mut phrase = quoted_pattern()
        .captures(question)
        .map(|caps| caps[1].trim().to_string());

    if phrase.is_none() {
        if let Some(m) = at_on_pattern().find(question) {
            let remaining = &question[m.end()..];
            let cut = phrase_boundary_pattern()
                .find(remaining)
                .map(|b| b.start())
                .unwrap_or(remaining.len());
            phrase = Some(remaining[..cut].trim().to_string());
        }
    }

    let raw = phrase?;
    let cleaned = strip_punctuation_pattern().replace_all(&raw, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }

    let lowered = cleaned.to_lowercase();
    let collides = vocab
        .categories
        .iter()
        .chain(vocab.sources.iter())
        .any(|known| known.to_lowercase() == lowered);
    if collides {
        return None;
    }

    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary {
            categories: vec!["Essentials".into(), "Food".into(), "Travel".into()],
            merchants: vec![
                "Blue Bottle".into(),
                "Uber".into(),
                "Whole Foods Market".into(),
            ],
            sources: vec!["Amex".into(), "Checking".into()],
        }
    }

    #[test]
    fn test_extract_month_numeric() {
        assert_eq!(
            extract_month("How much in 2025-06?").unwrap().to_string(),
            "2025-06"
        );
        assert_eq!(extract_month("spend in 2025-13"), None);
        assert_eq!(extract_month("no month here"), None);
    }

    #[test]
    fn test_extract_month_natural() {
        assert_eq!(
            extract_month("What did I spend in June 2025?")
                .unwrap()
                .to_string(),
            "2025-06"
        );
        assert_eq!(
            extract_month("jun 2025 food spend").unwrap().to_string(),
            "2025-06"
        );
        assert_eq!(
            extract_month("totals for September 2024").unwrap().to_string(),
            "2024-09"
        );
    }

    #[test]
    fn test_vocabulary_exact_match() {
        let m = match_vocabulary("How much did I spend on Food?", &vocab().categories).unwrap();
        assert_eq!(m.value, "Food");
        assert_eq!(m.confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_vocabulary_match_is_case_insensitive() {
        let m = match_vocabulary("how much on FOOD?", &vocab().categories).unwrap();
        assert_eq!(m.value, "Food");
    }

    #[test]
    fn test_vocabulary_no_partial_word_match() {
        // "Foodie" must not match "Food" - word boundary required
        assert!(match_vocabulary("I am a Foodie", &vocab().categories).is_none());
    }

    #[test]
    fn test_vocabulary_token_match_multiword() {
        let m = match_vocabulary(
            "spending at the whole foods on Market street",
            &vocab().merchants,
        )
        .unwrap();
        assert_eq!(m.value, "Whole Foods Market");
        assert_eq!(m.confidence, MatchConfidence::Token);
    }

    #[test]
    fn test_resolve_merchant_from_vocab() {
        let e = resolve("How much at Blue Bottle in 2025-06?", &vocab());
        let merchant = e.merchant.unwrap();
        assert_eq!(merchant.value, "Blue Bottle");
        assert_eq!(merchant.confidence, MatchConfidence::Exact);
    }

    #[test]
    fn test_resolve_unknown_merchant_phrase() {
        let e = resolve("How much at Starbs in 2025-06?", &vocab());
        let merchant = e.merchant.unwrap();
        assert_eq!(merchant.value, "Starbs");
        assert_eq!(merchant.confidence, MatchConfidence::Unknown);
    }

    #[test]
    fn test_resolve_quoted_merchant_phrase() {
        let e = resolve("What did I spend with \"Corner Store\" in 2025-06?", &vocab());
        let merchant = e.merchant.unwrap();
        assert_eq!(merchant.value, "Corner Store");
        assert_eq!(merchant.confidence, MatchConfidence::Unknown);
    }

    #[test]
    fn test_harvest_stops_at_boundary() {
        let e = resolve("spend at Starbs during the trip", &vocab());
        assert_eq!(e.merchant.unwrap().value, "Starbs");
    }

    #[test]
    fn test_harvest_does_not_shadow_category_or_source() {
        // "on Food" names a category, not a merchant
        let e = resolve("How much did I spend on Food in 2025-06?", &vocab());
        assert!(e.category.is_some());
        assert_eq!(e.category.unwrap().value, "Food");

        // "on Amex" names a source
        let e = resolve("How much did I spend on Amex in 2025-06?", &vocab());
        assert!(e.source.is_some());
        assert!(e.merchant.is_none());
    }

    #[test]
    fn test_resolve_nothing() {
        let e = resolve("hello there", &vocab());
        assert_eq!(e, Entities::default());
    }

    #[test]
    fn test_deterministic_tie_break() {
        let entries = vec!["Gas".to_string(), "Gas Station".to_string()];
        let m = match_vocabulary("paid at the gas station", &entries).unwrap();
        // Both match; longer entry wins
        assert_eq!(m.value, "Gas Station");
    }
}

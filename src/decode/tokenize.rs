use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b[\w']+\b").unwrap();
    static ref NON_LETTER: Regex = Regex::new(r"[^a-z']").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub is_word: bool,
    /// Set only on word segments whose normalized form was flagged.
    pub flagged: bool,
}

/// Splits text into alternating word and separator segments. Joining the
/// segment texts gives back the input unchanged.
pub fn tokenize(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for word in WORD.find_iter(text) {
        if word.start() > cursor {
            segments.push(separator(&text[cursor..word.start()]));
        }
        segments.push(Segment {
            text: word.as_str().to_string(),
            is_word: true,
            flagged: false,
        });
        cursor = word.end();
    }
    if cursor < text.len() {
        segments.push(separator(&text[cursor..]));
    }
    segments
}

fn separator(text: &str) -> Segment {
    Segment { text: text.to_string(), is_word: false, flagged: false }
}

pub fn normalize_token(token: &str) -> String {
    NON_LETTER.replace_all(&token.to_lowercase(), "").into_owned()
}

pub fn highlight(text: &str, flagged_words: &[String]) -> Vec<Segment> {
    let flagged: HashSet<String> = flagged_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();
    let mut segments = tokenize(text);
    if flagged.is_empty() {
        return segments;
    }
    for segment in segments.iter_mut().filter(|s| s.is_word) {
        segment.flagged = flagged.contains(&normalize_token(&segment.text));
    }
    segments
}

//! Turns whatever the model sent back into `corrected` / `reply` /
//! `wrongWords`.
//!
//! Strategies run in order and the first one that recovers structure wins:
//! strict JSON, a fenced code block, the outermost `{...}` slice, then
//! per-field regex extraction. When nothing is recovered the payload is shown
//! as text, with JSON punctuation stripped if it looked like JSON. Decoding
//! never fails.

pub mod tokenize;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"(?is)```(?:json)?\s*(.*?)```").unwrap();
    static ref LOOSE_CORRECTED: Regex = Regex::new(r#"(?is)"?corrected"?\s*:\s*"(.*?)"[,}]"#).unwrap();
    static ref LOOSE_REPLY: Regex = Regex::new(r#"(?is)"?reply"?\s*:\s*"(.*?)"[,}]"#).unwrap();
    static ref LOOSE_WRONG_WORDS: Regex = Regex::new(r#"(?is)"?wrongWords"?\s*:\s*\[(.*?)\]"#).unwrap();
    static ref LOOKS_JSON: Regex = Regex::new(r#"\{\s*"?\w+"?\s*:"#).unwrap();
    static ref JSON_PUNCTUATION: Regex = Regex::new(r#"\{\s*|\s*\}|""#).unwrap();
    static ref FIELD_LABEL: Regex = Regex::new(r"(?i)\b(corrected|reply|wrongWords)\s*:").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Strict,
    Fenced,
    Braces,
    Loose,
    /// Looked like JSON but nothing parsed; braces, quotes and labels removed.
    Stripped,
    /// Plain text, shown as-is.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub corrected: Option<String>,
    pub reply: String,
    pub flagged_words: Option<Vec<String>>,
    pub strategy: DecodeStrategy,
}

impl DecodedResponse {
    /// True when no structured field could be recovered.
    pub fn is_degraded(&self) -> bool {
        matches!(self.strategy, DecodeStrategy::Stripped | DecodeStrategy::Raw)
    }

    /// Text for the tutor bubble: the correction first when there is one.
    pub fn display_text(&self) -> String {
        match self.corrected.as_deref() {
            Some(corrected) => format!("Correction: {}\n\n{}", corrected, self.reply).trim().to_string(),
            None => self.reply.trim().to_string(),
        }
    }
}

type Strategy = fn(&str) -> Option<DecodedResponse>;

const STRATEGIES: [Strategy; 4] = [decode_strict, decode_fenced, decode_braces, decode_loose];

pub fn decode(payload: &str) -> DecodedResponse {
    STRATEGIES.iter()
        .find_map(|strategy| strategy(payload))
        .unwrap_or_else(|| fallback(payload))
}

fn decode_strict(payload: &str) -> Option<DecodedResponse> {
    parse_object(payload, payload, DecodeStrategy::Strict)
}

fn decode_fenced(payload: &str) -> Option<DecodedResponse> {
    let inner = FENCE.captures(payload)?.get(1)?.as_str();
    parse_object(inner, payload, DecodeStrategy::Fenced)
}

fn decode_braces(payload: &str) -> Option<DecodedResponse> {
    let start = payload.find('{')?;
    let end = payload.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&payload[start..=end], payload, DecodeStrategy::Braces)
}

fn decode_loose(payload: &str) -> Option<DecodedResponse> {
    let corrected = first_capture(&LOOSE_CORRECTED, payload);
    let reply = first_capture(&LOOSE_REPLY, payload);
    let flagged_words = first_capture(&LOOSE_WRONG_WORDS, payload).and_then(|items| {
        match serde_json::from_str::<Value>(&format!("[{}]", items)) {
            Ok(Value::Array(values)) => Some(string_items(&values)),
            _ => None,
        }
    });

    if corrected.is_none() && reply.is_none() && flagged_words.is_none() {
        return None;
    }
    Some(DecodedResponse {
        corrected: corrected.filter(|c| !c.is_empty()),
        reply: reply.unwrap_or_else(|| payload.trim().to_string()),
        flagged_words,
        strategy: DecodeStrategy::Loose,
    })
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

fn fallback(payload: &str) -> DecodedResponse {
    if LOOKS_JSON.is_match(payload) {
        let without_punctuation = JSON_PUNCTUATION.replace_all(payload, "");
        let readable = FIELD_LABEL.replace_all(&without_punctuation, "");
        return DecodedResponse {
            corrected: None,
            reply: readable.trim().to_string(),
            flagged_words: None,
            strategy: DecodeStrategy::Stripped,
        };
    }
    DecodedResponse {
        corrected: None,
        reply: payload.trim().to_string(),
        flagged_words: None,
        strategy: DecodeStrategy::Raw,
    }
}

/// Parses `candidate` as a JSON object carrying at least one usable field.
/// `payload` supplies the reply only when the object has no scalar `reply`;
/// an empty `reply` stays empty.
fn parse_object(candidate: &str, payload: &str, strategy: DecodeStrategy) -> Option<DecodedResponse> {
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    let object = value.as_object()?;

    let corrected = object.get("corrected").and_then(scalar_text).filter(|s| !s.is_empty());
    let reply = object.get("reply").and_then(scalar_text);
    let flagged_words = match object.get("wrongWords") {
        Some(Value::Array(values)) => Some(string_items(values)),
        _ => None,
    };

    let has_reply = reply.as_deref().is_some_and(|r| !r.is_empty());
    if corrected.is_none() && !has_reply && flagged_words.is_none() {
        return None;
    }
    Some(DecodedResponse {
        corrected,
        reply: reply.unwrap_or_else(|| payload.trim().to_string()),
        flagged_words,
        strategy,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_items(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json() {
        let decoded = decode(r#"{"corrected":"I am fine.","reply":"Great!","wrongWords":["am"]}"#);
        assert_eq!(decoded.corrected.as_deref(), Some("I am fine."));
        assert_eq!(decoded.reply, "Great!");
        assert_eq!(decoded.flagged_words, Some(vec!["am".to_string()]));
        assert_eq!(decoded.strategy, DecodeStrategy::Strict);
        assert!(!decoded.is_degraded());
    }

    #[test]
    fn fenced_block() {
        let decoded = decode("```json\n{\"reply\":\"Hi\"}\n```");
        assert_eq!(decoded.reply, "Hi");
        assert_eq!(decoded.corrected, None);
        assert_eq!(decoded.strategy, DecodeStrategy::Fenced);
    }

    #[test]
    fn untagged_fence_inside_prose() {
        let decoded = decode("Sure! Here you go:\n```\n{\"corrected\":\"She goes.\",\"reply\":\"Nice\"}\n```\nBye");
        assert_eq!(decoded.corrected.as_deref(), Some("She goes."));
        assert_eq!(decoded.reply, "Nice");
        assert_eq!(decoded.strategy, DecodeStrategy::Fenced);
    }

    #[test]
    fn object_embedded_in_prose() {
        let decoded = decode(r#"Here is my answer: {"reply":"Sounds fun","wrongWords":[]} hope it helps"#);
        assert_eq!(decoded.reply, "Sounds fun");
        assert_eq!(decoded.flagged_words, Some(vec![]));
        assert_eq!(decoded.strategy, DecodeStrategy::Braces);
    }

    #[test]
    fn loose_fields_from_broken_json() {
        let payload = r#"{"corrected": "I went home.", "reply": "Why?", "wrongWords": ["goed", 3, "home"] trailing"#;
        let decoded = decode(payload);
        assert_eq!(decoded.strategy, DecodeStrategy::Loose);
        assert_eq!(decoded.corrected.as_deref(), Some("I went home."));
        assert_eq!(decoded.reply, "Why?");
        assert_eq!(decoded.flagged_words, Some(vec!["goed".to_string(), "home".to_string()]));
    }

    #[test]
    fn loose_without_reply_keeps_raw_text() {
        let payload = r#"corrected: "We are here", oops"#;
        let decoded = decode(payload);
        assert_eq!(decoded.strategy, DecodeStrategy::Loose);
        assert_eq!(decoded.corrected.as_deref(), Some("We are here"));
        assert_eq!(decoded.reply, payload);
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        let decoded = decode("not json at all");
        assert_eq!(decoded.reply, "not json at all");
        assert_eq!(decoded.corrected, None);
        assert_eq!(decoded.flagged_words, None);
        assert_eq!(decoded.strategy, DecodeStrategy::Raw);
        assert!(decoded.is_degraded());
    }

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(decode("  hello there \n").reply, "hello there");
    }

    #[test]
    fn json_looking_garbage_is_stripped() {
        let decoded = decode(r#"{"answer": "keep talking"#);
        assert_eq!(decoded.strategy, DecodeStrategy::Stripped);
        assert_eq!(decoded.reply, "answer: keep talking");
    }

    #[test]
    fn object_without_known_fields_falls_through() {
        let decoded = decode(r#"{"foo": "bar"}"#);
        assert_eq!(decoded.strategy, DecodeStrategy::Stripped);
        assert_eq!(decoded.reply, "foo: bar");
    }

    #[test]
    fn empty_correction_is_absent() {
        let decoded = decode(r#"{"corrected":"","reply":"Perfect sentence!"}"#);
        assert_eq!(decoded.corrected, None);
        assert_eq!(decoded.display_text(), "Perfect sentence!");
    }

    #[test]
    fn empty_reply_keeps_braces_out_of_display() {
        let decoded = decode(r#"{"corrected":"I am fine.","reply":""}"#);
        assert_eq!(decoded.strategy, DecodeStrategy::Strict);
        assert_eq!(decoded.reply, "");
        assert_eq!(decoded.display_text(), "Correction: I am fine.");
    }

    #[test]
    fn missing_reply_falls_back_to_payload() {
        let payload = r#"{"corrected":"I am fine."}"#;
        let decoded = decode(payload);
        assert_eq!(decoded.corrected.as_deref(), Some("I am fine."));
        assert_eq!(decoded.reply, payload);
    }

    #[test]
    fn display_text_leads_with_correction() {
        let decoded = decode(r#"{"corrected":"I am fine.","reply":"Great!"}"#);
        assert_eq!(decoded.display_text(), "Correction: I am fine.\n\nGreat!");
    }

    #[test]
    fn empty_payload_is_empty_reply() {
        let decoded = decode("");
        assert_eq!(decoded.reply, "");
        assert_eq!(decoded.strategy, DecodeStrategy::Raw);
    }
}

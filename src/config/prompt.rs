use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

const CHAT_TURN_TEMPLATE: &str = "You are a friendly English tutor. Return ONLY valid JSON with the following shape and nothing else (no markdown):\n\n{\n  \"corrected\": string,\n  \"reply\": string,\n  \"wrongWords\": string[]\n}\n\nRules:\n- corrected: provide a single corrected version of the user's sentence.\n- reply: a natural, friendly continuation in English to keep the conversation going.\n- wrongWords: array of individual words from the user's ORIGINAL message that are misspelled or ungrammatical and should be highlighted. Exclude punctuation, use lowercase, include each word at most once.\n\nUser: \"{message}\"";

const WORD_TRANSLATION_TEMPLATE: &str = "Translate the English word to {language}. Respond with ONLY the {language} single-word or short phrase, no punctuation or extra text.\nWord: \"{word}\"";

const INTRO: &str = "Let's start chatting in English! What would you like to talk about today?";

/// User-facing strings shown instead of errors.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Notices {
    pub chat_quota_exceeded: String,
    pub translation_rate_limited: String,
    pub translation_unavailable: String,
    pub translation_not_found: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            chat_quota_exceeded: "Ücretsiz kullanım kotasını aştınız. Lütfen biraz bekleyip tekrar deneyin.".to_string(),
            translation_rate_limited: "Sınır aşıldı, lütfen biraz bekleyin.".to_string(),
            translation_unavailable: "Çeviri yapılamadı".to_string(),
            translation_not_found: "Çeviri bulunamadı".to_string(),
        }
    }
}

/// Templates use `{message}`, `{word}` and `{language}` placeholders.
/// Any field missing from a prompts file keeps its built-in value.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    pub chat_turn: String,
    pub word_translation: String,
    pub intro: String,
    pub target_language: String,
    pub notices: Notices,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            chat_turn: CHAT_TURN_TEMPLATE.to_string(),
            word_translation: WORD_TRANSLATION_TEMPLATE.to_string(),
            intro: INTRO.to_string(),
            target_language: "Turkish".to_string(),
            notices: Notices::default(),
        }
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    info!("Loaded prompts from: {}", path.as_ref().display());
    Ok(Arc::new(config))
}

pub fn get_chat_prompt(config: &PromptConfig, message: &str) -> String {
    config.chat_turn.replace("{message}", message)
}

pub fn get_translation_prompt(config: &PromptConfig, word: &str) -> String {
    config.word_translation
        .replace("{language}", &config.target_language)
        .replace("{word}", word)
}

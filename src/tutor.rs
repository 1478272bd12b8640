use log::{ debug, info, warn };
use std::sync::Arc;

use crate::cache::TranslationCache;
use crate::config::prompt::{ self, PromptConfig };
use crate::decode::{ self, tokenize::{ highlight, Segment } };
use crate::llm::chat::ChatClient;
use crate::llm::error::ChatError;
use crate::models::chat::{ Message, MessageStatus };

pub const INTRO_MESSAGE_ID: &str = "ai-intro";

/// One tutoring conversation held in memory. Chat turns and word lookups
/// share the same paced client.
pub struct TutorSession {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    translations: TranslationCache,
    messages: Vec<Message>,
}

impl TutorSession {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompt_config: Arc<PromptConfig>) -> Self {
        let intro = Message::with_id(INTRO_MESSAGE_ID, &prompt_config.intro, false);
        Self {
            chat_client,
            prompt_config,
            translations: TranslationCache::new(),
            messages: vec![intro],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn prompt_config(&self) -> &PromptConfig {
        &self.prompt_config
    }

    pub fn translations(&self) -> &TranslationCache {
        &self.translations
    }

    pub fn last_failed(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_failed())
    }

    /// Sends one user turn. Returns the tutor's reply, or `None` when the
    /// input was blank. On failure the user message stays in the list marked
    /// `Failed` and the error is returned.
    pub async fn send(&mut self, text: &str) -> Result<Option<Message>, ChatError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let user_message = Message::user(text);
        let user_id = user_message.id.clone();
        self.messages.push(user_message);

        match self.exchange(text).await {
            Ok(decoded) => {
                if let Some(message) = self.find_mut(&user_id) {
                    message.status = MessageStatus::Delivered;
                    if let Some(words) = decoded.flagged_words.clone().filter(|w| !w.is_empty()) {
                        message.flagged_words = Some(words);
                    }
                }
                if decoded.is_degraded() {
                    debug!("Tutor reply for {} could not be decoded as structured JSON", user_id);
                }
                let reply = Message::tutor(&decoded.display_text());
                self.messages.push(reply.clone());
                Ok(Some(reply))
            }
            Err(e) => {
                warn!("Send failed for {}: {}", user_id, e);
                if let Some(message) = self.find_mut(&user_id) {
                    message.status = MessageStatus::Failed;
                }
                Err(e)
            }
        }
    }

    /// Drops a failed user message and sends its text again as a new one.
    pub async fn retry(&mut self, message_id: &str) -> Result<Option<Message>, ChatError> {
        let position = self.messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| ChatError::MessageNotFound(message_id.to_string()))?;
        if !self.messages[position].is_failed() {
            return Err(ChatError::NotRetryable(message_id.to_string()));
        }
        let failed = self.messages.remove(position);
        info!("Retrying message {}", failed.id);
        self.send(&failed.text).await
    }

    /// Short translation of one word. Never fails: throttling and other
    /// failures come back as notice strings, which are not cached.
    pub async fn translate_word(&self, word: &str) -> String {
        let notices = &self.prompt_config.notices;
        if let Some(hit) = self.translations.get(word).await {
            debug!("Translation cache hit for '{}'", word);
            return hit;
        }

        let tprompt = prompt::get_translation_prompt(&self.prompt_config, word);
        let response = match self.chat_client.generate(&tprompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Translation of '{}' failed: {}", word, e);
                return notices.translation_unavailable.clone();
            }
        };
        if !response.is_success() {
            warn!("Translation of '{}' returned status {}", word, response.status);
            if response.status == 429 {
                return notices.translation_rate_limited.clone();
            }
            return notices.translation_unavailable.clone();
        }

        let text = match response.candidate_text() {
            Ok(text) => text,
            Err(e) => {
                warn!("Translation of '{}' had an unreadable body: {}", word, e);
                return notices.translation_unavailable.clone();
            }
        };
        let clean = strip_outer_quotes(text.trim());
        if clean.is_empty() {
            return notices.translation_not_found.clone();
        }
        self.translations.insert(word, clean).await;
        clean.to_string()
    }

    /// User message split into segments with flagged words marked.
    pub fn highlight(&self, message: &Message) -> Vec<Segment> {
        let flagged = message.flagged_words.as_deref().unwrap_or(&[]);
        highlight(&message.text, flagged)
    }

    async fn exchange(&self, text: &str) -> Result<decode::DecodedResponse, ChatError> {
        let chat_prompt = prompt::get_chat_prompt(&self.prompt_config, text);
        let response = self.chat_client.generate(&chat_prompt).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        let payload = response.candidate_text()?;
        Ok(decode::decode(&payload))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}

fn strip_outer_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::Notices;
    use crate::llm::chat::GeminiChatClient;
    use crate::llm::mock::{ ManualClock, ScriptedTransport };
    use crate::llm::pacing::{ PacingGate, RetryPolicy };
    use crate::llm::transport::HttpResponse;
    use crate::llm::LlmConfig;
    use std::time::Duration;

    fn candidate(text: &str) -> Result<HttpResponse, ChatError> {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        });
        Ok(HttpResponse { status: 200, body: body.to_string() })
    }

    fn status(code: u16) -> Result<HttpResponse, ChatError> {
        Ok(HttpResponse { status: code, body: r#"{"error":{"message":"nope"}}"#.to_string() })
    }

    fn session(
        script: Vec<Result<HttpResponse, ChatError>>
    ) -> (TutorSession, Arc<ScriptedTransport>) {
        let clock = Arc::new(ManualClock::new());
        let transport = Arc::new(ScriptedTransport::new(script));
        let gate = Arc::new(PacingGate::new(clock, Duration::from_millis(5000)));
        let client = GeminiChatClient::new(
            LlmConfig::with_api_key("k"),
            transport.clone(),
            gate,
            RetryPolicy::default()
        );
        (TutorSession::new(Arc::new(client), Arc::new(PromptConfig::default())), transport)
    }

    #[tokio::test]
    async fn starts_with_intro() {
        let (session, _) = session(vec![]);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].id, INTRO_MESSAGE_ID);
        assert!(!session.messages()[0].from_user);
    }

    #[tokio::test]
    async fn send_appends_reply_and_flags_words() {
        let (mut session, transport) = session(
            vec![candidate(r#"{"corrected":"I am fine.","reply":"Great!","wrongWords":["is"]}"#)]
        );

        let reply = session.send("I is fine.").await.unwrap().unwrap();
        assert_eq!(reply.text, "Correction: I am fine.\n\nGreat!");
        assert!(!reply.from_user);

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        let user = &messages[1];
        assert!(user.from_user);
        assert_eq!(user.status, MessageStatus::Delivered);
        assert_eq!(user.flagged_words, Some(vec!["is".to_string()]));

        let flagged: Vec<String> = session
            .highlight(user)
            .into_iter()
            .filter(|s| s.flagged)
            .map(|s| s.text)
            .collect();
        assert_eq!(flagged, vec!["is".to_string()]);

        let prompt = &transport.requests()[0].payload.contents[0].parts[0].text;
        assert!(prompt.ends_with("User: \"I is fine.\""));
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let (mut session, transport) = session(vec![]);
        assert!(session.send("   ").await.unwrap().is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn plain_text_reply_is_shown_verbatim() {
        let (mut session, _) = session(vec![candidate("not json at all")]);
        let reply = session.send("hello").await.unwrap().unwrap();
        assert_eq!(reply.text, "not json at all");
        assert_eq!(session.messages()[1].flagged_words, None);
    }

    #[tokio::test]
    async fn api_error_marks_message_failed() {
        let (mut session, _) = session(vec![status(400)]);
        let err = session.send("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "API Error: 400 - nope");
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].status, MessageStatus::Failed);
    }

    #[tokio::test]
    async fn exhausted_throttling_is_surfaced_as_throttled() {
        let (mut session, transport) = session(vec![status(429), status(429), status(429), status(429)]);
        let err = session.send("hello").await.unwrap_err();
        assert!(err.is_throttled());
        assert_eq!(transport.requests().len(), 4);
        assert!(session.last_failed().is_some());
    }

    #[tokio::test]
    async fn retry_replaces_failed_message() {
        let (mut session, _) = session(vec![status(500), candidate(r#"{"reply":"Welcome back"}"#)]);
        session.send("Good morning").await.unwrap_err();
        let failed = session.last_failed().cloned().unwrap();

        let reply = session.retry(&failed.id).await.unwrap().unwrap();
        assert_eq!(reply.text, "Welcome back");

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.id != failed.id));
        assert_eq!(messages[1].text, "Good morning");
        assert_eq!(messages[1].status, MessageStatus::Delivered);
        assert!(session.last_failed().is_none());
    }

    #[tokio::test]
    async fn retry_rejects_unknown_and_delivered_messages() {
        let (mut session, _) = session(vec![]);
        assert!(matches!(session.retry("nope").await, Err(ChatError::MessageNotFound(_))));
        assert!(
            matches!(session.retry(INTRO_MESSAGE_ID).await, Err(ChatError::NotRetryable(_)))
        );
    }

    #[tokio::test]
    async fn translation_is_cached_case_insensitively() {
        let (session, transport) = session(vec![candidate("\"elma\"\n")]);
        assert_eq!(session.translate_word("Apple").await, "elma");
        assert_eq!(session.translate_word("apple").await, "elma");
        assert_eq!(transport.requests().len(), 1);
        let prompt = &transport.requests()[0].payload.contents[0].parts[0].text;
        assert!(prompt.contains("to Turkish"));
        assert!(prompt.ends_with("Word: \"Apple\""));
    }

    #[tokio::test]
    async fn translation_notices_are_not_cached() {
        let (session, transport) = session(
            vec![status(429), status(429), status(429), status(429), status(500), candidate("")]
        );
        let notices = Notices::default();
        assert_eq!(session.translate_word("run").await, notices.translation_rate_limited);
        assert_eq!(session.translate_word("run").await, notices.translation_unavailable);
        assert_eq!(session.translate_word("run").await, notices.translation_not_found);
        assert!(session.translations().is_empty().await);
        assert_eq!(transport.requests().len(), 6);
    }

    #[tokio::test]
    async fn translation_transport_failure_is_a_notice() {
        let (session, _) = session(vec![Err(ChatError::Transport("offline".into()))]);
        assert_eq!(
            session.translate_word("tree").await,
            Notices::default().translation_unavailable
        );
    }

}

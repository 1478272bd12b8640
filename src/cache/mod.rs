use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-lifetime word → translation map. Keys are lowercased; entries are
/// never evicted.
#[derive(Clone, Default)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The word lowercased, nothing else; surrounding whitespace is significant.
    pub fn key(word: &str) -> String {
        word.to_lowercase()
    }

    pub async fn get(&self, word: &str) -> Option<String> {
        self.entries.read().await.get(&Self::key(word)).cloned()
    }

    pub async fn insert(&self, word: &str, translation: &str) {
        self.entries.write().await.insert(Self::key(word), translation.to_string());
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

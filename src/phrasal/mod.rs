pub mod quiz;

use serde::{ Deserialize, Serialize };
use std::collections::HashSet;

const BUILTIN_DECK: &str = include_str!("../../data/phrasal_verbs.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasalVerb {
    pub id: String,
    pub verb: String,
    pub meaning: String,
    pub example: String,
}

/// Flashcard deck with per-card favorites.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<PhrasalVerb>,
    favorites: HashSet<String>,
}

impl Deck {
    pub fn new(cards: Vec<PhrasalVerb>) -> Self {
        Self { cards, favorites: HashSet::new() }
    }

    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_DECK)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn cards(&self) -> &[PhrasalVerb] {
        &self.cards
    }

    pub fn get(&self, id: &str) -> Option<&PhrasalVerb> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    /// Flips the favorite flag and returns the new value, or `None` for an
    /// unknown id.
    pub fn toggle_favorite(&mut self, id: &str) -> Option<bool> {
        self.get(id)?;
        if self.favorites.remove(id) {
            Some(false)
        } else {
            self.favorites.insert(id.to_string());
            Some(true)
        }
    }

    pub fn favorites(&self) -> Vec<&PhrasalVerb> {
        self.cards
            .iter()
            .filter(|c| self.favorites.contains(&c.id))
            .collect()
    }
}

use rand::seq::SliceRandom;
use rand::Rng;

use super::PhrasalVerb;

const DISTRACTORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

/// One question per card in random order. Options are the card's meaning
/// plus up to three other distinct meanings, shuffled.
pub fn generate_questions<R: Rng + ?Sized>(cards: &[PhrasalVerb], rng: &mut R) -> Vec<Question> {
    let mut order: Vec<&PhrasalVerb> = cards.iter().collect();
    order.shuffle(rng);

    order
        .into_iter()
        .map(|card| {
            let mut others: Vec<&str> = Vec::new();
            for other in cards {
                let meaning = other.meaning.as_str();
                if other.id != card.id && meaning != card.meaning && !others.contains(&meaning) {
                    others.push(meaning);
                }
            }
            others.shuffle(rng);
            others.truncate(DISTRACTORS);

            let mut options: Vec<String> = others.into_iter().map(str::to_string).collect();
            options.push(card.meaning.clone());
            options.shuffle(rng);
            let answer_index = options
                .iter()
                .position(|o| *o == card.meaning)
                .unwrap_or_default();

            Question {
                prompt: format!("\"{}\" ne anlama geliyor?", card.verb),
                options,
                answer_index,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// `next` was called before answering.
    AwaitingAnswer,
    Advanced,
    Finished,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    score: usize,
    selected: Option<usize>,
    finished: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        let finished = questions.is_empty();
        Self { questions, current: 0, score: 0, selected: None, finished }
    }

    pub fn current(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current)
    }

    pub fn position(&self) -> usize {
        self.current + 1
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Answers the current question. Only the first selection counts; later
    /// ones and out-of-range indexes return `None`.
    pub fn select(&mut self, index: usize) -> Option<bool> {
        if self.selected.is_some() {
            return None;
        }
        let question = self.current()?;
        if index >= question.options.len() {
            return None;
        }
        let correct = index == question.answer_index;
        self.selected = Some(index);
        if correct {
            self.score += 1;
        }
        Some(correct)
    }

    pub fn next(&mut self) -> QuizStep {
        if self.finished {
            return QuizStep::Finished;
        }
        if self.selected.is_none() {
            return QuizStep::AwaitingAnswer;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            QuizStep::Advanced
        } else {
            self.finished = true;
            QuizStep::Finished
        }
    }

    /// Fraction of questions answered so far, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.questions.is_empty() {
            return 1.0;
        }
        if self.finished {
            return 1.0;
        }
        let answered = self.current + usize::from(self.selected.is_some());
        answered as f32 / self.questions.len() as f32
    }

    pub fn restart(&mut self) {
        self.current = 0;
        self.score = 0;
        self.selected = None;
        self.finished = self.questions.is_empty();
    }
}

use futures::{ Stream, StreamExt };
use log::debug;
use std::io::{ self, Write };

use crate::decode::tokenize::Segment;
use crate::llm::error::ChatError;
use crate::models::chat::Message;
use crate::phrasal::quiz::{ generate_questions, QuizSession };
use crate::phrasal::Deck;
use crate::tutor::TutorSession;

const HELP: &str = "Commands:
  <text>        send a message to the tutor
  /retry        resend the last failed message
  /t <word>     translate a word
  /history      show the conversation
  /cards        list phrasal verbs (* marks favorites)
  /fav <id>     toggle a phrasal verb as favorite
  /quiz         start a phrasal verb quiz
  /help         show this help
  /quit         exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    Retry,
    Translate(String),
    History,
    Cards,
    Favorite(String),
    Quiz,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(ReplCommand::Send(line.to_string()));
        }
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let command = match (name, rest.is_empty()) {
            ("/retry", _) => ReplCommand::Retry,
            ("/t", false) => ReplCommand::Translate(rest.to_string()),
            ("/history", _) => ReplCommand::History,
            ("/cards", _) => ReplCommand::Cards,
            ("/fav", false) => ReplCommand::Favorite(rest.to_string()),
            ("/quiz", _) => ReplCommand::Quiz,
            ("/help", _) => ReplCommand::Help,
            ("/quit" | "/exit", _) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Flagged words are wrapped in `*` so they stand out in a terminal.
pub fn render_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| if s.flagged { format!("*{}*", s.text) } else { s.text.clone() })
        .collect()
}

pub struct Repl<W: Write> {
    session: TutorSession,
    deck: Deck,
    out: W,
}

impl<W: Write> Repl<W> {
    pub fn new(session: TutorSession, deck: Deck, out: W) -> Self {
        Self { session, deck, out }
    }

    pub fn session(&self) -> &TutorSession {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run<S>(&mut self, lines: &mut S) -> io::Result<()>
        where S: Stream<Item = io::Result<String>> + Unpin
    {
        if let Some(intro) = self.session.messages().first().cloned() {
            self.print_message(&intro)?;
        }
        writeln!(self.out, "(type /help for commands)")?;

        while let Some(line) = lines.next().await {
            let line = line?;
            let Some(command) = ReplCommand::parse(&line) else {
                continue;
            };
            debug!("REPL command: {:?}", command);
            match command {
                ReplCommand::Quit => break,
                ReplCommand::Send(text) => {
                    let outcome = self.session.send(&text).await;
                    self.report_send(outcome)?;
                }
                ReplCommand::Retry => self.retry_last().await?,
                ReplCommand::Translate(word) => self.translate_words(&[word]).await?,
                ReplCommand::History => self.print_history()?,
                ReplCommand::Cards => self.print_cards()?,
                ReplCommand::Favorite(id) => self.toggle_favorite(&id)?,
                ReplCommand::Quiz => self.run_quiz(lines, None).await?,
                ReplCommand::Help => writeln!(self.out, "{}", HELP)?,
                ReplCommand::Unknown(raw) => writeln!(self.out, "Unknown command: {}", raw)?,
            }
        }
        self.out.flush()
    }

    pub async fn translate_words(&mut self, words: &[String]) -> io::Result<()> {
        for word in words {
            let translation = self.session.translate_word(word).await;
            writeln!(self.out, "{} → {}", word, translation)?;
        }
        Ok(())
    }

    pub fn print_cards(&mut self) -> io::Result<()> {
        for card in self.deck.cards() {
            let marker = if self.deck.is_favorite(&card.id) { "*" } else { " " };
            writeln!(self.out, "{}{:>3}. {}: {}", marker, card.id, card.verb, card.meaning)?;
            writeln!(self.out, "      e.g. {}", card.example)?;
        }
        Ok(())
    }

    pub async fn run_quiz<S>(&mut self, lines: &mut S, limit: Option<usize>) -> io::Result<()>
        where S: Stream<Item = io::Result<String>> + Unpin
    {
        let mut questions = generate_questions(self.deck.cards(), &mut rand::thread_rng());
        if let Some(limit) = limit {
            questions.truncate(limit);
        }
        let mut quiz = QuizSession::new(questions);

        while let Some(question) = quiz.current().cloned() {
            writeln!(self.out, "\n[{}/{}] {}", quiz.position(), quiz.total(), question.prompt)?;
            for (i, option) in question.options.iter().enumerate() {
                writeln!(self.out, "  {}) {}", i + 1, option)?;
            }

            let choice = loop {
                let Some(line) = lines.next().await else {
                    return Ok(());
                };
                let line = line?;
                let line = line.trim();
                if line == "/quit" {
                    writeln!(self.out, "Quiz stopped. Score: {}/{}", quiz.score(), quiz.total())?;
                    return Ok(());
                }
                match line.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= question.options.len() => break n - 1,
                    _ => writeln!(self.out, "Pick a number from 1 to {}", question.options.len())?,
                }
            };

            match quiz.select(choice) {
                Some(true) => writeln!(self.out, "Correct!")?,
                Some(false) => {
                    writeln!(
                        self.out,
                        "Wrong. Answer: {}",
                        question.options[question.answer_index]
                    )?
                }
                None => {}
            }
            quiz.next();
        }

        writeln!(self.out, "\nScore: {}/{}", quiz.score(), quiz.total())
    }

    async fn retry_last(&mut self) -> io::Result<()> {
        let Some(failed_id) = self.session.last_failed().map(|m| m.id.clone()) else {
            return writeln!(self.out, "Nothing to retry.");
        };
        let outcome = self.session.retry(&failed_id).await;
        self.report_send(outcome)
    }

    fn report_send(&mut self, outcome: Result<Option<Message>, ChatError>) -> io::Result<()> {
        match outcome {
            Ok(Some(reply)) => {
                if let Some(user) = self.session.messages().iter().rev().find(|m| m.from_user) {
                    if user.flagged_words.is_some() {
                        let rendered = render_segments(&self.session.highlight(user));
                        writeln!(self.out, "you: {}", rendered)?;
                    }
                }
                self.print_message(&reply)
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let notice = if e.is_throttled() {
                    self.session.prompt_config().notices.chat_quota_exceeded.clone()
                } else {
                    e.to_string()
                };
                writeln!(self.out, "(!) {}", notice)?;
                writeln!(self.out, "Message marked as failed. Type /retry to send it again.")
            }
        }
    }

    fn print_history(&mut self) -> io::Result<()> {
        let messages: Vec<Message> = self.session.messages().to_vec();
        for message in &messages {
            self.print_message(message)?;
        }
        Ok(())
    }

    fn print_message(&mut self, message: &Message) -> io::Result<()> {
        if message.from_user {
            let rendered = render_segments(&self.session.highlight(message));
            let marker = if message.is_failed() { " (!)" } else { "" };
            writeln!(self.out, "you: {}{}", rendered, marker)
        } else {
            writeln!(self.out, "tutor: {}", message.text)
        }
    }

    fn toggle_favorite(&mut self, id: &str) -> io::Result<()> {
        match self.deck.toggle_favorite(id) {
            Some(true) => writeln!(self.out, "Added {} to favorites.", id),
            Some(false) => writeln!(self.out, "Removed {} from favorites.", id),
            None => writeln!(self.out, "No phrasal verb with id {}.", id),
        }
    }
}

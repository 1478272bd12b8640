use clap::{ Parser, Subcommand };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Generation Service Args ---
    /// API key for the generation service. Calls fail with a configuration error when unset.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the generation API, without the model path
    #[arg(long, env = "GEMINI_BASE_URL", default_value = "https://generativelanguage.googleapis.com/v1beta")]
    pub base_url: String,

    /// Model used for chat turns and word translations
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub model: String,

    /// Optional HTTP timeout in seconds. No timeout when unset.
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    // --- Pacing & Retry Args ---
    /// Minimum spacing between generation calls, in milliseconds
    #[arg(long, env = "REQUEST_INTERVAL_MS", default_value = "5000")]
    pub request_interval_ms: u64,

    /// Retries allowed for a call answered with 429 or 503
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// First backoff delay after a throttled response, in milliseconds
    #[arg(long, env = "INITIAL_BACKOFF_MS", default_value = "1500")]
    pub initial_backoff_ms: u64,

    /// Upper bound for the doubling backoff delay, in milliseconds
    #[arg(long, env = "MAX_BACKOFF_MS", default_value = "10000")]
    pub max_backoff_ms: u64,

    // --- Prompt Args ---
    /// Path to a JSON file overriding prompt templates and notices
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Language word translations are requested in
    #[arg(long, env = "TARGET_LANGUAGE")]
    pub target_language: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive tutoring chat (default)
    Chat,
    /// Translate one or more words and exit
    Translate {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// List the phrasal-verb flashcards
    Cards,
    /// Multiple-choice phrasal-verb quiz
    Quiz {
        /// Ask at most this many questions
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pacing_constants() {
        let args = Args::try_parse_from(["easy-english"]).unwrap();
        assert_eq!(args.request_interval_ms, crate::llm::pacing::REQUEST_INTERVAL_MS);
        assert_eq!(args.max_retries, crate::llm::pacing::MAX_RETRIES);
        assert_eq!(args.initial_backoff_ms, crate::llm::pacing::INITIAL_BACKOFF_MS);
        assert_eq!(args.max_backoff_ms, crate::llm::pacing::MAX_BACKOFF_MS);
        assert_eq!(args.model, crate::llm::DEFAULT_MODEL);
        assert_eq!(args.base_url, crate::llm::DEFAULT_BASE_URL);
    }

    #[test]
    fn parses_subcommands() {
        let args = Args::try_parse_from(["easy-english", "translate", "apple", "run"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Translate { words: vec!["apple".into(), "run".into()] })
        );

        let args = Args::try_parse_from(["easy-english", "quiz", "--limit", "5"]).unwrap();
        assert_eq!(args.command, Some(Command::Quiz { limit: Some(5) }));
    }
}

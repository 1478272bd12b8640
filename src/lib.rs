pub mod cache;
pub mod cli;
pub mod config;
pub mod decode;
pub mod llm;
pub mod models;
pub mod phrasal;
pub mod repl;
pub mod tutor;

use cli::{ Args, Command };
use config::prompt::{ self, PromptConfig };
use llm::chat::GeminiChatClient;
use llm::pacing::{ PacingGate, RetryPolicy, TokioClock };
use llm::transport::ReqwestTransport;
use llm::LlmConfig;
use log::{ info, warn };
use phrasal::Deck;
use repl::Repl;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio_stream::wrappers::LinesStream;
use tutor::TutorSession;

pub fn build_session(args: &Args) -> Result<TutorSession, Box<dyn Error + Send + Sync>> {
    let mut prompt_config = match &args.prompts_path {
        Some(path) => (*prompt::load_prompts(path)?).clone(),
        None => PromptConfig::default(),
    };
    if let Some(language) = args.target_language.as_ref().filter(|l| !l.trim().is_empty()) {
        prompt_config.target_language = language.clone();
    }

    let llm_config = LlmConfig {
        api_key: args.api_key.clone().filter(|k| !k.trim().is_empty()),
        base_url: args.base_url.clone(),
        model: args.model.clone(),
    };
    if llm_config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat and translation requests will fail.");
    }

    let transport = Arc::new(ReqwestTransport::new(args.http_timeout_secs.map(Duration::from_secs))?);
    let gate = Arc::new(
        PacingGate::new(Arc::new(TokioClock), Duration::from_millis(args.request_interval_ms))
    );
    let policy = RetryPolicy {
        max_retries: args.max_retries,
        initial_backoff: Duration::from_millis(args.initial_backoff_ms),
        max_backoff: Duration::from_millis(args.max_backoff_ms),
    };
    let chat_client = Arc::new(GeminiChatClient::new(llm_config, transport, gate, policy));

    Ok(TutorSession::new(chat_client, Arc::new(prompt_config)))
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Model: {}", args.model);
    info!("Base URL: {}", args.base_url);
    info!("API Key Set: {}", args.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()));
    info!("Request Interval: {} ms", args.request_interval_ms);
    info!("Max Retries: {}", args.max_retries);
    info!("Backoff: {} ms doubling up to {} ms", args.initial_backoff_ms, args.max_backoff_ms);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    let session = build_session(&args)?;
    let deck = Deck::builtin()?;
    let mut repl = Repl::new(session, deck, std::io::stdout());
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => repl.run(&mut lines).await?,
        Command::Translate { words } => repl.translate_words(&words).await?,
        Command::Cards => repl.print_cards()?,
        Command::Quiz { limit } => repl.run_quiz(&mut lines, limit).await?,
    }

    Ok(())
}

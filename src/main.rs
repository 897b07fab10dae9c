mod logging;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use lantern_cli::{
    Answer, AnswerSource, ChatSession, InputHistory, Interrupt, QueryAnswerer, Turn,
    UnconfiguredProvider, clear_thinking, display_banner, interrupt_channel, print_answer,
    print_help, print_notice, print_thinking, read_input,
};
use lantern_core::{CompletionProvider, IndexingConfig, Retriever};
use lantern_groq::GroqClient;
use lantern_rag::{
    IndexBuilder, LocalRetriever, PromptComposer, RagConfig, embedder_from_config, load_documents,
};

type Answerer = QueryAnswerer<Arc<dyn CompletionProvider>, LocalRetriever>;

/// Exit status after an interrupt at the prompt
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(name = "lantern")]
#[command(about = "Ask questions about your stories and get simple explanations", long_about = None)]
struct Cli {
    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the story index from a directory of text files
    Index {
        /// Directory of story files (defaults to LANTERN_DOCS_DIR or ./stories)
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Split stories into chunks of this many characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by consecutive chunks (default: 200, capped at a fifth of the chunk size)
        #[arg(long, requires = "chunk_size")]
        chunk_overlap: Option<usize>,
    },
    /// Answer a single question and exit
    Ask {
        /// The question to ask
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Interactive chat (default)
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = RagConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Index {
            docs,
            chunk_size,
            chunk_overlap,
        } => run_index(&config, docs, chunk_size, chunk_overlap).await,
        Commands::Ask { question } => run_ask(build_answerer(&config), &question.join(" ")).await,
        Commands::Chat => run_chat(build_answerer(&config)).await,
    }
}

async fn run_index(
    config: &RagConfig,
    docs: Option<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
) -> Result<()> {
    let docs_dir = docs.unwrap_or_else(|| config.docs_dir.clone());
    let documents = load_documents(&docs_dir).await?;
    if documents.is_empty() {
        println!(
            "{} No story files found in {}",
            "⚠️".yellow(),
            docs_dir.display()
        );
    }

    let indexing = match chunk_size {
        Some(size) => IndexingConfig::chunked(size, chunk_overlap),
        None => IndexingConfig::default(),
    };
    let builder = IndexBuilder::with_config(embedder_from_config(config)?, indexing);

    println!("{} Indexing {} documents...", "📚".blue(), documents.len());
    let paths = config.index_paths();
    let result = builder.build_and_persist(&documents, &paths).await?;

    println!(
        "{} Indexed {} entries from {} documents ({}, dimension {})",
        "✅".green(),
        result.entries_indexed,
        result.documents_read,
        result.embedder,
        result.dimension
    );
    println!("   {} {}", "index:".dimmed(), paths.index.display());
    println!("   {} {}", "texts:".dimmed(), paths.texts.display());
    Ok(())
}

fn build_answerer(config: &RagConfig) -> Answerer {
    let provider: Arc<dyn CompletionProvider> = match GroqClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "completion client unavailable, grounded questions will report it");
            Arc::new(UnconfiguredProvider::new(e.to_string()))
        }
    };

    let retriever = match embedder_from_config(config)
        .and_then(|embedder| LocalRetriever::load(&config.index_paths(), embedder))
    {
        Ok(retriever) => Some(retriever),
        Err(e) => {
            warn!(error = %e, "story index unavailable, answers will use the fallback");
            None
        }
    };

    QueryAnswerer::new(provider, PromptComposer::new(config.answer_language.clone()))
        .with_optional_retriever(retriever)
        .with_generation_config(config.generation_config())
        .with_top_k(config.top_k)
}

async fn run_ask(answerer: Answerer, question: &str) -> Result<()> {
    let Some(answer) = answerer.answer(question).await else {
        bail!("question must not be empty");
    };
    print_answer(&answer);
    if answer.source == AnswerSource::Error {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_chat(answerer: Answerer) -> Result<()> {
    let answerer = Arc::new(answerer);
    display_banner(
        answerer.model_id(),
        answerer.retriever().map(LocalRetriever::len),
    );
    if !answerer.has_retriever() {
        print_notice("No story index loaded. Run `lantern index` to build one.");
    }

    let (gate, mut cancel_signal) = interrupt_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if gate.interrupt() == Interrupt::Exit {
                println!();
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
    });

    let mut session = ChatSession::new(Arc::clone(&answerer));
    let mut history = InputHistory::new();
    print_last_turn(session.transcript());

    loop {
        let Some(line) = tokio::task::block_in_place(|| read_input(&mut history))? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "help" => {
                print_help();
                continue;
            }
            "reset" => {
                session.reset();
                print_notice("Conversation cleared.");
                print_last_turn(session.transcript());
                continue;
            }
            "stats" => {
                match answerer.retriever() {
                    Some(retriever) => {
                        let state = if retriever.is_ready() { "ready" } else { "empty" };
                        print_notice(&format!("index {}: {}", state, retriever.stats()));
                    }
                    None => print_notice("No story index loaded."),
                }
                continue;
            }
            _ => {}
        }

        let pending = match session.submit(input) {
            Ok(Some(pending)) => pending,
            Ok(None) => continue,
            Err(e) => {
                print_notice(&e.to_string());
                continue;
            }
        };

        print_thinking();
        let outcome = cancel_signal.wait(pending).await;
        clear_thinking();
        match outcome {
            Some(Ok(answer)) => {
                print_answer(&answer);
                session.complete(&answer);
            }
            Some(Err(e)) => print_notice(&e.to_string()),
            None => {
                session.cancel();
                print_notice("Cancelled.");
            }
        }
    }

    println!("{}", "👋 Goodbye!".green());
    Ok(())
}

/// Show the newest transcript turn, the welcome message after a reset
fn print_last_turn(transcript: &[Turn]) {
    if let Some(turn) = transcript.last() {
        print_answer(&Answer {
            text: turn.text.clone(),
            source: AnswerSource::Generated,
        });
    }
}

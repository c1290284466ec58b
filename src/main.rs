use std::sync::Arc;

use anyhow::{Context, Result};
use campus_qa::config::{Config, Credentials, effective_top_k};
use campus_qa::pipeline::{Outcome, QaPipeline};
use campus_qa::web::{self, AppState};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "campus-qa",
    version,
    about = "Answer questions about a college from its indexed documents"
)]
struct Cli {
    /// Deployment config (JSON, or TOML by extension)
    #[arg(long, short, env = "CAMPUS_QA_CONFIG", default_value = "config.json")]
    config: String,

    /// API key for the embedding and chat models
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// API key for the vector index
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the question page
    Serve {
        /// Address to bind (host:port); overrides the config file
        #[arg(long, env = "CAMPUS_QA_BIND")]
        bind: Option<String>,
    },
    /// Answer a single question on stdout
    Ask {
        question: String,

        /// Number of passages used as context
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn main() -> Result<()> {
    // .env is optional; real environment variables win.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Load config
    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    // 2. Credentials: fatal before any network call
    let credentials = Credentials::new(cli.openai_api_key, cli.pinecone_api_key)
        .context("Missing API keys. Please contact the administrator.")?;

    // 3. Upstream clients
    let pipeline = QaPipeline::from_config(&config, &credentials)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            tracing::info!("Starting {} Q&A server...", config.branding.institution);
            let state = Arc::new(AppState::new(pipeline, &config));
            runtime.block_on(web::serve(state, &bind))
        }
        Command::Ask { question, top_k } => {
            let top_k = effective_top_k(top_k, config.search_top_k);
            let reply = runtime.block_on(pipeline.ask_with_top_k(&question, top_k));
            for notice in &reply.notices {
                eprintln!("error: {notice}");
            }
            if let Some(warning) = reply.warning() {
                eprintln!("{warning}");
            }
            if let Outcome::Answered { answer, sources } = reply.outcome {
                println!("{answer}\n");
                println!("sources");
                for (i, source) in sources.iter().enumerate() {
                    println!("{}. {}", i + 1, source.title);
                    println!("URL: {}", source.url);
                    println!("---");
                }
            }
            Ok(())
        }
    }
}

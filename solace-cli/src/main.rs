//! # Solace CLI
//!
//! Command-line interface for the support personas and the meme agent.
//!
//! Usage:
//!   solace serve [--bind <addr>]
//!   solace support --text <feelings> [--image <path>]...
//!   solace meme <query> [--model OPEN_AI]
//!
//! Examples:
//!   solace serve --bind 0.0.0.0:8501
//!   solace support --text "She left without a word" --image chat.png
//!   solace meme "Rust compile times while the deadline approaches"

mod backend;
mod web;

use anyhow::{Context, Result};
use backend::{PersonaBackend, SupportSettings};
use clap::{Args, Parser, Subcommand};
use solace_agent::{
    Credential, ImageUpload, MemeWorkflow, ModelSelector, PersonaCatalog, StagingMode,
    SupportRequest,
};
use solace_llm::BrowserBridge;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "solace")]
#[command(author, version, about = "Solace - emotional support personas and a meme agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (tracing EnvFilter syntax)
    #[arg(long = "log", env = "RUST_LOG", default_value = "info", global = true)]
    log_filter: String,

    /// Quiet mode - only print the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the support web form
    Serve {
        /// Address to listen on
        #[arg(long, env = "SOLACE_BIND", default_value = "127.0.0.1:8501")]
        bind: String,

        #[command(flatten)]
        personas: PersonaOptions,
    },
    /// Run the four support personas once and print their replies
    Support {
        /// How you are feeling
        #[arg(short, long)]
        text: Option<String>,

        /// Chat screenshot (JPEG or PNG); repeat for more
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,

        /// API key for the persona backend
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        personas: PersonaOptions,
    },
    /// Generate a meme through the browser automation agent
    Meme {
        /// What the meme should be about; flags may come before or after it
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Model the automation agent reasons with
        #[arg(long, default_value = "OPEN_AI")]
        model: String,

        /// API key for the automation model
        #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Browser automation service
        #[arg(long, env = "SOLACE_AUTOMATION_URL", default_value = "http://localhost:5170")]
        automation_url: String,

        /// Request timeout for one automation run, in seconds
        #[arg(long, default_value_t = 900)]
        timeout: u64,
    },
}

#[derive(Args, Clone)]
struct PersonaOptions {
    /// Language model backend for the personas
    #[arg(long, value_enum, default_value_t = PersonaBackend::Gemini)]
    provider: PersonaBackend,

    /// Override the provider's API base URL
    #[arg(long, env = "SOLACE_PROVIDER_URL")]
    provider_url: Option<String>,

    /// Persona catalog TOML overriding the built-in personas
    #[arg(long, env = "SOLACE_PERSONAS")]
    personas: Option<PathBuf>,

    /// Only send the first screenshot that stages successfully
    #[arg(long)]
    first_image_only: bool,
}

impl PersonaOptions {
    fn settings(&self) -> Result<SupportSettings> {
        let catalog = match &self.personas {
            Some(path) => PersonaCatalog::load(path)
                .with_context(|| format!("failed to load persona catalog {}", path.display()))?,
            None => PersonaCatalog::builtin(),
        };
        let mode = if self.first_image_only {
            StagingMode::FirstOnly
        } else {
            StagingMode::Accumulate
        };

        Ok(SupportSettings::new(catalog)
            .with_backend(self.provider)
            .with_provider_url(self.provider_url.clone())
            .with_staging_mode(mode))
    }
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let level = log_filter
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(log_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}

async fn serve(bind: &str, options: &PersonaOptions) -> Result<()> {
    let settings = options.settings()?;
    tracing::info!(
        provider = ?settings.backend,
        catalog_version = settings.catalog.version(),
        "starting support web form"
    );

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, web::router(settings))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("web server failed")
}

async fn run_support(
    text: Option<String>,
    images: &[PathBuf],
    api_key: Option<String>,
    json: bool,
    options: &PersonaOptions,
    quiet: bool,
) -> Result<()> {
    let credential = Credential::new(api_key.unwrap_or_default())
        .context("an API key is required (--api-key or GEMINI_API_KEY)")?;
    let settings = options.settings()?;

    let mut uploads = Vec::with_capacity(images.len());
    for path in images {
        match ImageUpload::from_path(path).await {
            Ok(upload) => uploads.push(upload),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "skipping image"),
        }
    }

    let request = SupportRequest { text, uploads };
    if !quiet {
        eprintln!("Solace - your personalized recovery plan\n");
    }

    let report = settings.run(&credential, &request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_markdown());
    }

    if !quiet {
        eprintln!(
            "--- {} persona calls, {} tokens ---",
            report.usage.calls(),
            report.usage.total_tokens()
        );
    }
    Ok(())
}

/// Fail fast before a run that may block for the whole request timeout
async fn ensure_automation_ready(bridge: &BrowserBridge) -> Result<()> {
    let healthy = bridge.health_check().await.with_context(|| {
        format!("browser automation service is not running at {}", bridge.base_url())
    })?;
    if !healthy {
        anyhow::bail!("browser automation service at {} is not healthy", bridge.base_url());
    }
    Ok(())
}

async fn run_meme(
    query: &[String],
    model: &str,
    api_key: Option<String>,
    automation_url: &str,
    timeout: u64,
    quiet: bool,
) -> Result<()> {
    let model: ModelSelector = model.parse()?;
    let credential = Credential::new(api_key.unwrap_or_default())
        .context("an API key is required (--api-key or OPENAI_KEY)")?;
    let query = query.join(" ");

    let bridge = BrowserBridge::new(automation_url, timeout)?;
    ensure_automation_ready(&bridge).await?;
    let workflow = MemeWorkflow::new(bridge);
    if !quiet {
        eprintln!("Generating meme for: {}\n", query);
    }

    let result = workflow.generate(&query, model, &credential).await?;

    match result.url {
        Some(url) => println!("{}", url),
        None => {
            eprintln!("No meme URL found in the automation result.");
            if !quiet {
                if let Some(text) = result.history.final_result() {
                    eprintln!("Final result was: {}", text);
                }
            }
            std::process::exit(2);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter)?;

    let outcome = match &cli.command {
        Commands::Serve { bind, personas } => serve(bind, personas).await,
        Commands::Support {
            text,
            images,
            api_key,
            json,
            personas,
        } => run_support(text.clone(), images, api_key.clone(), *json, personas, cli.quiet).await,
        Commands::Meme {
            query,
            model,
            api_key,
            automation_url,
            timeout,
        } => run_meme(query, model, api_key.clone(), automation_url, *timeout, cli.quiet).await,
    };

    if let Err(err) = outcome {
        tracing::error!(error = %err, "command failed");
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
    Ok(())
}

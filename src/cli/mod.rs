//! # CLI Module
//!
//! Command-line interface for the picture-match game backend.
//!
//! ## Usage
//! ```bash
//! # Score two images (local files or URLs)
//! picture-match score target.png candidate.jpg
//!
//! # JSON output
//! picture-match score target.png https://example.com/candidate.png --output json
//!
//! # Start a round (needs OPENAI_API_KEY)
//! picture-match round --language en
//!
//! # Generate an image from your own prompt
//! picture-match generate "A cat wearing a tiny hat"
//!
//! # Serve the JSON API
//! picture-match serve --port 3000
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use picture_match::core::game::{GameConfig, GameService};
use picture_match::core::generator::Language;
use picture_match::core::scorer::{Comparison, ScoreTier};
use picture_match::error::{GameError, Result};
use picture_match::events::{
    CompareEvent, Event, EventChannel, EventReceiver, GenerateEvent, WorkflowEvent,
};
use picture_match::server::GameApi;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Picture Match - recreate the hidden picture with your own prompt
#[derive(Parser, Debug)]
#[command(name = "picture-match")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Wall-clock budget for each workflow, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score how similar two images are (0-100)
    Score {
        /// Target image (file path or http(s) URL)
        target: String,

        /// Candidate image (file path or http(s) URL)
        candidate: String,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Start a round: draw a hidden prompt and generate its image
    Round {
        /// Prompt language
        #[arg(short, long, default_value = "no")]
        language: LanguageArg,

        /// Reveal the hidden prompt
        #[arg(long)]
        reveal: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Generate an image from your own prompt
    Generate {
        /// The prompt
        prompt: String,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Serve the JSON API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    /// Norwegian
    No,
    /// English
    En,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::No => Language::No,
            LanguageArg::En => Language::En,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    picture_match::init_tracing();

    let mut config = GameConfig::from_env()?;
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            return Err(GameError::Config("--timeout-secs must be positive".to_string()));
        }
        config = config.with_budget(Duration::from_secs(secs));
    }

    match cli.command {
        Commands::Score {
            target,
            candidate,
            output,
        } => run_score(&config.with_local_files(true), &target, &candidate, output),
        Commands::Round {
            language,
            reveal,
            output,
        } => run_round(&config, language.into(), reveal, output),
        Commands::Generate { prompt, output } => run_generate(&config, &prompt, output),
        Commands::Serve { host, port } => run_serve(&config, &host, port),
    }
}

/// Spinner that follows workflow events until every sender is dropped
fn spawn_progress(receiver: EventReceiver, enabled: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        let spinner = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        for event in receiver.iter() {
            let Some(pb) = spinner.as_ref() else { continue };
            match event {
                Event::Workflow(WorkflowEvent::StageChanged { stage }) => {
                    pb.set_message(format!("{}...", stage));
                }
                Event::Compare(CompareEvent::ImageFetched { label, bytes }) => {
                    pb.set_message(format!("Fetched {} image ({})", label, format_bytes(bytes)));
                }
                Event::Generate(GenerateEvent::Completed { duration_ms, .. }) => {
                    pb.set_message(format!("Image ready in {:.1}s", duration_ms as f64 / 1000.0));
                }
                _ => {}
            }
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
    })
}

/// Build a service wired to a progress spinner, run `work`, then tear down
fn with_service<T>(
    config: &GameConfig,
    output: OutputFormat,
    work: impl FnOnce(&GameService) -> Result<T>,
) -> Result<T> {
    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, output == OutputFormat::Pretty);

    let result = GameService::from_config(config, Some(sender)).and_then(|service| work(&service));

    // The service (and its sender) is gone; the spinner thread drains and exits.
    progress.join().ok();
    result
}

fn run_score(config: &GameConfig, target: &str, candidate: &str, output: OutputFormat) -> Result<()> {
    let comparison = with_service(config, output, |service| service.compare(target, candidate))?;

    match output {
        OutputFormat::Pretty => print_pretty_comparison(&Term::stdout(), target, candidate, &comparison),
        OutputFormat::Json => print_json(&serde_json::json!({
            "target": target,
            "candidate": candidate,
            "score": comparison.score,
            "tier": comparison.tier,
            "mse": comparison.mse,
        })),
    }
    Ok(())
}

fn run_round(config: &GameConfig, language: Language, reveal: bool, output: OutputFormat) -> Result<()> {
    let round = with_service(config, output, |service| service.new_round(language))?;

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!(
                "{} Round {}",
                style("✓").green().bold(),
                style(round.id).dim()
            ))
            .ok();
            term.write_line(&format!("  {} {}", style("Target:").bold(), round.image_url))
                .ok();
            if reveal {
                term.write_line(&format!("  {} {}", style("Prompt:").bold(), round.prompt))
                    .ok();
            } else {
                term.write_line(&format!(
                    "  {}",
                    style("Prompt hidden. Pass --reveal to show it.").dim()
                ))
                .ok();
            }
        }
        OutputFormat::Json => {
            let mut value = serde_json::json!({
                "id": round.id,
                "language": round.language,
                "url": round.image_url,
                "created_at": round.created_at,
            });
            if reveal {
                value["prompt"] = serde_json::Value::String(round.prompt);
            }
            print_json(&value);
        }
    }
    Ok(())
}

fn run_generate(config: &GameConfig, prompt: &str, output: OutputFormat) -> Result<()> {
    let url = with_service(config, output, |service| service.generate(prompt))?;

    match output {
        OutputFormat::Pretty => println!("{}", url),
        OutputFormat::Json => print_json(&serde_json::json!({ "url": url })),
    }
    Ok(())
}

fn run_serve(config: &GameConfig, host: &str, port: u16) -> Result<()> {
    let service = GameService::from_config(config, None)?;
    if !service.can_generate() {
        tracing::warn!("OPENAI_API_KEY is not set; /api/generate will fail until it is");
    }
    tracing::info!(
        "Starting picture-match v{} (budget {}s)",
        env!("CARGO_PKG_VERSION"),
        service.budget().as_secs()
    );

    let sys = actix_web::rt::System::new();
    sys.block_on(GameApi::start(service, host, port))
        .map_err(|e| GameError::Internal(format!("HTTP server error: {}", e)))
}

fn print_pretty_comparison(term: &Term, target: &str, candidate: &str, comparison: &Comparison) {
    let score = format!("{}%", comparison.score);
    let (score, feedback) = match comparison.tier {
        ScoreTier::Great => (
            style(score).green().bold(),
            "Amazing! The images are very similar!",
        ),
        ScoreTier::Good => (
            style(score).yellow().bold(),
            "Good job! Try to make the images even more similar!",
        ),
        ScoreTier::TryAgain => (
            style(score).red().bold(),
            "Try again! Think about what makes the images different.",
        ),
    };

    term.write_line(&format!("  {} {}", style("Target:   ").dim(), target))
        .ok();
    term.write_line(&format!("  {} {}", style("Candidate:").dim(), candidate))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!("  {} {}", style("Score:").bold(), score))
        .ok();
    term.write_line(&format!("  {}", feedback)).ok();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

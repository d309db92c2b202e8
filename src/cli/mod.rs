pub mod args;
pub mod commands;

use clap::{Parser, Subcommand};
use colored::*;
use log::debug;

use crate::api::{ApiType, RequestContext};
use crate::error::WarpError;

/// Korean Legal Information CLI
#[derive(Parser, Debug)]
#[command(
    name = "warp",
    about = "Korean Legal Information CLI - Search laws, ordinances, and legal documents from the terminal",
    version,
    author,
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Markdown format
    Markdown,
    /// CSV format
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search and view laws (국가법령)
    #[command(alias = "l")]
    Law(args::LawArgs),

    /// Search and view local ordinances (자치법규)
    #[command(alias = "o")]
    Ordinance(args::OrdinanceArgs),

    /// Search precedents (판례)
    #[command(alias = "p")]
    Precedent(args::PrecedentArgs),

    /// Search administrative rules (행정규칙)
    #[command(alias = "a")]
    Admrule(args::AdmruleArgs),

    /// Search legal interpretations (법령해석례)
    #[command(alias = "i")]
    Interpretation(args::InterpretationArgs),

    /// Search national laws and local ordinances together
    #[command(alias = "s")]
    Search(args::SearchArgs),

    /// Manage configuration
    #[command(alias = "c")]
    Config(args::ConfigArgs),
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> crate::error::Result<()> {
        let cli = Self::parse();

        let default_filter = if cli.verbose { "debug" } else { "warn" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .init();

        // Ctrl-C cancels the in-flight request instead of killing the process mid-write
        let ctx = RequestContext::new();
        let interrupt = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupted, cancelling request");
                interrupt.cancel();
            }
        });

        let format = cli.format;
        let result = match cli.command {
            Commands::Law(args) => commands::law::execute(&ctx, args, format).await,
            Commands::Ordinance(args) => commands::ordinance::execute(&ctx, args, format).await,
            Commands::Precedent(args) => commands::precedent::execute(&ctx, args, format).await,
            Commands::Admrule(args) => commands::admrule::execute(&ctx, args, format).await,
            Commands::Interpretation(args) => {
                commands::interpretation::execute(&ctx, args, format).await
            }
            Commands::Search(args) => commands::search::execute(&ctx, args, format).await,
            Commands::Config(args) => commands::config::execute(args),
        };

        if let Err(e) = &result {
            report_error(e, cli.verbose);
        }
        result
    }
}

/// Guide shown when a backend has no usable key
pub fn api_key_guide(error: &WarpError) -> String {
    let key = match error {
        WarpError::NoApiKey { key } => key.clone(),
        _ => ApiType::All.config_key().to_string(),
    };

    let mut guide = String::new();
    guide.push_str(&format!("{} {}\n\n", "🔑".yellow(), error));
    guide.push_str("To use this service, you need an API key (OC) from https://open.law.go.kr\n");
    guide.push_str("1. Sign up and request Open API access\n");
    guide.push_str("2. Configure the key:\n");
    guide.push_str(&format!("     warp config set {} YOUR_API_KEY\n", key));
    if key != ApiType::All.config_key() {
        guide.push_str(&format!(
            "   or share one key across all services:\n     warp config set {} YOUR_API_KEY\n",
            ApiType::All.config_key()
        ));
    }
    guide
}

fn report_error(error: &WarpError, verbose: bool) {
    if error.is_api_key_error() {
        eprintln!("{}", api_key_guide(error));
        return;
    }

    match error {
        WarpError::ApiError { code, message, .. } => {
            eprintln!("{} {}", "Error:".red(), message);
            if verbose {
                eprintln!("Code: {}", code);
            }
        }
        WarpError::Parse(msg) => {
            eprintln!("{} failed to read the response: {}", "Error:".red(), msg);
            if !verbose {
                eprintln!("\nRun with --verbose for more details.");
            }
        }
        _ => eprintln!("{} {}", "Error:".red(), error),
    }

    if let Some(hint) = error.hint() {
        eprintln!("\n{} {}", "Hint:".cyan(), hint);
    }
}

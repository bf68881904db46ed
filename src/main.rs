//! MailMind CLI - Structured email analysis
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use mailmind::input::{self, EmailSource};
use mailmind::pipeline::{self, InterpretOptions};
use mailmind::{ui, Config, LanguageMode, Outcome, Strategy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailmind")]
#[command(author, version, about = "Structured, bilingual email analysis with LLMs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse an email from a file, --text, an editor, or piped stdin
    Analyze {
        /// .txt or .eml file with the email
        file: Option<PathBuf>,
        /// Email text given inline
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Open $EDITOR to paste the email
        #[arg(long, conflicts_with_all = ["file", "text"])]
        edit: bool,
        /// Spanish only
        #[arg(long)]
        single: bool,
        /// Ask for free text and split it on language markers instead of JSON
        #[arg(long)]
        split: bool,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Sampling temperature in [0, 1]
        #[arg(long)]
        temperature: Option<f32>,
        /// Maximum output tokens
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Label prepended to action items (defaults to the detected main app)
        #[arg(long)]
        prefix: Option<String>,
        /// Save the result as analisis_correo.txt in DIR (default: current directory)
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
        save: Option<PathBuf>,
        /// Show the email text that would be analysed instead of calling the model
        #[arg(long)]
        raw: bool,
        /// Show the result in the tabbed terminal viewer
        #[arg(long)]
        tui: bool,
    },
    /// Interpret a saved JSON model reply without calling the model
    Parse {
        /// File with the raw model reply
        file: PathBuf,
        /// Spanish only
        #[arg(long)]
        single: bool,
        /// Label prepended to action items
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Split a saved free-text model reply into Spanish and English
    Split {
        /// File with the raw model reply
        file: PathBuf,
        /// Separator to try, in priority order (repeatable; replaces the configured list)
        #[arg(long = "marker")]
        markers: Vec<String>,
    },
    /// Print the JSON schema of the analysis record
    Schema,
    /// Print the effective configuration
    Config,
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Analyze {
            file,
            text,
            edit,
            single,
            split,
            model,
            temperature,
            max_tokens,
            prefix,
            save,
            raw,
            tui,
        }) => {
            let source = match (text, file) {
                (Some(text), _) => EmailSource::Text(text),
                (None, Some(path)) => EmailSource::File(path),
                (None, None) if edit => EmailSource::Editor,
                (None, None) if !atty::is(atty::Stream::Stdin) => EmailSource::Stdin,
                (None, None) => EmailSource::Editor,
            };
            let body = input::read_email(&source)?;

            if raw {
                println!("{}", body);
                println!("\n--- {} characters ---", body.chars().count());
                return Ok(());
            }

            let mut config = Config::load()?;
            if single {
                config.analysis.language_mode = LanguageMode::Single;
            }
            if split {
                config.analysis.strategy = Strategy::Split;
            }
            if let Some(model) = model {
                config.model.id = model;
            }
            if let Some(temperature) = temperature {
                config.model.temperature = temperature;
            }
            if let Some(max_tokens) = max_tokens {
                config.model.max_output_tokens = max_tokens;
            }
            if prefix.is_some() {
                config.analysis.action_prefix = prefix;
            }
            config.validate()?;

            if config.api_key().is_err() && atty::is(atty::Stream::Stdin) {
                // Kept for this run only, never written back.
                let key = dialoguer::Password::new()
                    .with_prompt("OpenAI API key")
                    .interact()?;
                config.api.openai_key = Some(key);
            }

            eprintln!(
                "{}",
                format!(
                    "Analysing {} characters with {}...",
                    body.chars().count(),
                    config.model.id
                )
                .dimmed()
            );
            let outcome = pipeline::analyze_email(&body, &config).await?;

            if tui {
                ui::run(&outcome)?;
            } else {
                print_outcome(&outcome);
            }

            if let Some(dir) = save {
                let path = outcome.export().write_to(&dir)?;
                eprintln!("{} {}", "Saved to".green(), path.display());
            }
        }
        Some(Commands::Parse {
            file,
            single,
            prefix,
        }) => {
            let config = Config::load()?;
            let raw = std::fs::read_to_string(&file)?;
            let mode = if single {
                LanguageMode::Single
            } else {
                config.analysis.language_mode
            };
            let prefix = prefix.or(config.analysis.action_prefix.clone());
            let outcome = pipeline::interpret(
                &raw,
                &InterpretOptions {
                    language_mode: mode,
                    strategy: Strategy::Structured,
                    action_prefix: prefix.as_deref(),
                    markers: &config.analysis.split_markers,
                },
            );
            print_outcome(&outcome);
        }
        Some(Commands::Split { file, markers }) => {
            let config = Config::load()?;
            let raw = std::fs::read_to_string(&file)?;
            let markers = if markers.is_empty() {
                config.analysis.split_markers.clone()
            } else {
                markers
            };
            let outcome = pipeline::interpret(
                &raw,
                &InterpretOptions {
                    language_mode: LanguageMode::Bilingual,
                    strategy: Strategy::Split,
                    action_prefix: None,
                    markers: &markers,
                },
            );
            print_outcome(&outcome);
        }
        Some(Commands::Schema) => {
            let schema = mailmind::AnalysisRecord::json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Some(Commands::Config) => {
            let config = Config::load()?;
            print!("{}", config.to_masked_toml()?);
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "mailmind", &mut std::io::stdout());
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Print the result; notices go to stderr so stdout stays exportable
fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Report(report) => {
            if let Some(notice) = &report.notice {
                eprintln!("{} {}", "⚠️ ".yellow(), notice.yellow());
            }
            println!("{}", report.text);
        }
        Outcome::Fallback { raw, message } => {
            eprintln!("{} {}", "⚠️  Could not interpret the reply:".red(), message);
            eprintln!("{}", "--- Raw model response ---".dimmed());
            println!("{}", raw);
        }
    }
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error};
use std::io::Write;
use std::path::{Path, PathBuf};

use mqm_ape::app_config::{self, Config, InferenceProvider};
use mqm_ape::{Controller, EvaluationRequest};

/// CLI Wrapper for InferenceProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliInferenceProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliInferenceProvider> for InferenceProvider {
    fn from(cli_provider: CliInferenceProvider) -> Self {
        match cli_provider {
            CliInferenceProvider::Ollama => InferenceProvider::Ollama,
            CliInferenceProvider::OpenAI => InferenceProvider::OpenAI,
            CliInferenceProvider::Anthropic => InferenceProvider::Anthropic,
            CliInferenceProvider::LMStudio => InferenceProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate translations with MQM-APE
    Evaluate(EvaluateArgs),

    /// Generate shell completions for mqm_ape
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct EvaluateArgs {
    /// Source segments, one per line
    #[arg(long, value_name = "FILE")]
    src: PathBuf,

    /// Translations to evaluate, one per line
    #[arg(long, value_name = "FILE")]
    tgt: PathBuf,

    /// Source language (ISO code or English name)
    #[arg(long)]
    srclang: String,

    /// Target language (ISO code or English name)
    #[arg(long)]
    tgtlang: String,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config: PathBuf,

    /// Verify post-edits with the quality-estimation metric instead of the LLM
    #[arg(long)]
    metric_verifier: bool,

    /// Save prompts, responses and omitted evaluator lines
    #[arg(long)]
    save_llm_response: bool,

    /// Inference provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliInferenceProvider>,

    /// Model name to use
    #[arg(short, long)]
    model: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// MQM-APE - interpretable translation evaluation with LLMs
///
/// Annotates translation errors, post-edits each error, verifies the
/// post-edits and scores every segment.
#[derive(Parser, Debug)]
#[command(name = "mqm_ape")]
#[command(version)]
#[command(about = "Interpretable machine-translation evaluation with LLMs")]
#[command(long_about = "MQM-APE identifies translation errors with an LLM, post-edits each error, keeps only the errors whose post-edit is verified as an improvement, and scores every segment.

EXAMPLES:
    mqm_ape evaluate --src src.txt --tgt mt.txt --srclang zh --tgtlang en --out results/
    mqm_ape evaluate --src src.txt --tgt mt.txt --srclang de --tgtlang en --out results/ --save-llm-response
    mqm_ape evaluate --src src.txt --tgt mt.txt --srclang en --tgtlang cs --out results/ --metric-verifier
    mqm_ape completions bash > mqm_ape.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server
    openai    - OpenAI API or any OpenAI-compatible server such as vLLM
    anthropic - Anthropic Claude API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => "",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {}{}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Info until the configuration is loaded
    if CustomLogger::init(LevelFilter::Info).is_err() {
        eprintln!("Failed to initialize logger");
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mqm_ape", &mut std::io::stdout());
            Ok(())
        }
        Commands::Evaluate(args) => run_evaluate(args).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut Config, options: &EvaluateArgs) {
    if let Some(provider) = &options.provider {
        config.inference.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        if let Some(provider_config) = config.inference.get_active_provider_config_mut() {
            provider_config.model = model.clone();
        }
    }

    if options.metric_verifier {
        config.verifier.use_metric = true;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_evaluate(options: EvaluateArgs) -> Result<()> {
    // Command-line log level applies before the config is read
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(Path::new(&options.config))?;
    apply_overrides(&mut config, &options);
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    let request = EvaluationRequest {
        source_path: options.src,
        target_path: options.tgt,
        source_language: options.srclang,
        target_language: options.tgtlang,
        output_dir: options.out,
        save_llm_response: options.save_llm_response,
    };

    controller.run(request).await.context("Evaluation failed")?;
    Ok(())
}

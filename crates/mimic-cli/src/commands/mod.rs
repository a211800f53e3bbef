use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mimic_config::{ConfigLoader, MimicConfig, WarningSeverity};
use mimic_core::{MimicError, Result};

mod run;

pub use run::{RunOutcome, RunOverrides, execute};

/// 🛒 Mimic — persona-driven web shopper simulator
#[derive(Parser)]
#[command(name = "mimic", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to mimic.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one persona through a simulated shopping session
    Run {
        /// Persona file (JSON)
        #[arg(short, long)]
        persona: PathBuf,
        /// Decision policy: component, cognitive_loop, full_agent
        #[arg(long)]
        policy: Option<String>,
        /// Step budget for the run
        #[arg(short = 'n', long)]
        max_steps: Option<usize>,
        /// Directory that receives run results
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Don't write results or per-tick traces
        #[arg(long)]
        no_traces: bool,
        /// Use the offline mock reasoner instead of the configured provider
        #[arg(long)]
        mock: bool,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the configuration for problems
    Validate,
    /// Show version and build info
    Version,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Read leniently so `validate` can report errors instead of failing on them.
        let config_path = ConfigLoader::resolve_path(self.config.as_deref());
        let config = ConfigLoader::apply_env_overrides(ConfigLoader::read(&config_path)?);

        // Resolve log level: --verbose > --quiet > --log-level > config default
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };
        init_tracing(log_level, &config.logging.format);

        match self.command {
            Commands::Run {
                persona,
                policy,
                max_steps,
                output,
                no_traces,
                mock,
            } => {
                let overrides = RunOverrides {
                    policy,
                    max_steps,
                    output,
                    no_traces,
                    mock,
                };
                run::cmd_run(config, &persona, overrides).await
            }
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Validate => Self::cmd_validate(&config, &config_path),
            Commands::Version => Self::cmd_version(),
        }
    }

    fn cmd_config(config: MimicConfig, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| MimicError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_validate(config: &MimicConfig, path: &std::path::Path) -> Result<()> {
        println!("🩺 Mimic — Configuration Check");
        println!("   File: {}", path.display());
        println!();

        let warnings = match config.validate() {
            Ok(w) => w,
            Err(e) => {
                println!("{e}");
                return Err(MimicError::Config("configuration is invalid".into()));
            }
        };

        let mut warn_count = 0;
        let mut info_count = 0;
        for w in &warnings {
            println!("  {w}");
            match w.severity {
                WarningSeverity::Warning => warn_count += 1,
                WarningSeverity::Info => info_count += 1,
                WarningSeverity::Error => {}
            }
        }

        if warnings.is_empty() {
            println!("  ✅ No issues found");
        }
        println!();
        println!(
            "  policy: {}, provider: {}, max_steps: {}",
            config.simulation.policy, config.llm.provider, config.simulation.max_steps
        );
        println!("  ⚠️  {warn_count} warnings, 💡 {info_count} suggestions");
        Ok(())
    }

    fn cmd_version() -> Result<()> {
        println!("🛒 Mimic v{}", env!("CARGO_PKG_VERSION"));
        println!("   Rust edition: 2024");
        println!("   Target: {}", std::env::consts::ARCH);
        println!("   OS: {}", std::env::consts::OS);
        #[cfg(debug_assertions)]
        println!("   Profile: debug");
        #[cfg(not(debug_assertions))]
        println!("   Profile: release");
        Ok(())
    }
}

fn init_tracing(level: &str, format: &str) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    match format {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .json()
            .with_target(true)
            .init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .compact()
            .with_target(false)
            .init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .init(),
    }
}

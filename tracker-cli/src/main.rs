//! tracker CLI - runs the daily tracker API and manages its database and config
//!
//! - `serve`: HTTP API (tasks, finance, habits, journal, study, AI)
//! - `migrate`: create or update the Postgres schema
//! - `config`: inspect the effective configuration
//! - `completions`: shell completion scripts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracker_core::TrackerConfig;

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "tracker",
    author,
    version,
    about = "Personal daily tracker: tasks, money, habits, journal and study in one API",
    long_about = "Run the daily tracker HTTP API backed by Postgres. Configuration comes from \
                  ./tracker.toml, ~/.daily-tracker/config.toml and the environment \
                  (DATABASE_URL, TRACKER_BIND, GEMINI_API_KEYS, GEMINI_MODEL)."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces to an OTLP endpoint (OTEL_EXPORTER_OTLP_ENDPOINT)
    #[cfg(feature = "telemetry")]
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update database tables
    Migrate(commands::migrate::MigrateArgs),
    /// Inspect configuration (show, path)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let tracing_config = tracing_setup::TracingConfig {
        debug: cli.debug,
        #[cfg(feature = "telemetry")]
        otel: cli.otel,
        #[cfg(not(feature = "telemetry"))]
        otel: false,
    };
    // A second init (e.g. in tests) is harmless
    tracing_setup::init(&tracing_config).ok();

    tracker_core::config::load_dotenv().context("failed to load .env files")?;

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args, TrackerConfig::load()).await,
        Commands::Migrate(args) => commands::run_migrate(args, TrackerConfig::load()).await,
        Commands::Config(args) => config::run_config(args),
        Commands::Completions(args) => run_completions(args),
    };

    tracing_setup::shutdown_otel();
    result
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn debug_flag_is_global() {
        let cli = Cli::try_parse_from(["tracker", "config", "show", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Config(_)));
    }
}

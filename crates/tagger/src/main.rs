//! Tagger CLI - tag-style image descriptions for object storage buckets.
//!
//! Tagger lists images under an S3 prefix, asks a vision-language model to
//! describe each one, and writes one JSON record per image.
//!
//! # Usage
//!
//! ```bash
//! # Fetch the model repository named by REPO_TO_DOWNLOAD into PATH_TO_SAVE
//! tagger download
//!
//! # Describe every image under S3_LIST_PREFIX
//! tagger generate
//!
//! # Inspect what would be processed
//! tagger list
//!
//! # View effective configuration
//! tagger config show
//! ```
//!
//! All settings come from environment variables (or a `.env` file).

use anyhow::Context;
use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Tagger - tag-style image descriptions for object storage buckets.
#[derive(Parser, Debug)]
#[command(name = "tagger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the model repository to local disk
    Download(cli::download::DownloadArgs),

    /// Describe every image under the configured prefix
    Generate(cli::generate::GenerateArgs),

    /// List object keys under a prefix
    List(cli::list::ListArgs),

    /// View configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Missing variables abort here, before any network or model activity.
    let config =
        tagger_core::Config::from_env().context("Failed to load configuration from environment")?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tagger v{}", tagger_core::VERSION);

    match cli.command {
        Commands::Download(args) => cli::download::execute(args, &config).await,
        Commands::Generate(args) => cli::generate::execute(args, config).await,
        Commands::List(args) => cli::list::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_with_model() {
        let cli = Cli::try_parse_from(["tagger", "generate", "--model", "qvq"]).unwrap();
        match cli.command {
            Commands::Generate(args) => assert!(matches!(args.model, cli::generate::Model::Qvq)),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tagger", "list", "-v", "--json-logs"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
    }
}

//! The `tagger generate` command: the batch description run.

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tagger_core::{BatchEvent, BatchRunner, BatchSummary, Config, ItemOutcome, ModelChoice};

/// Models selectable on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Model {
    /// Qwen2.5-VL instruct model at QWEN_MODEL_PATH (default)
    #[default]
    Qwen,
    /// QVQ reasoning model at QVQ_MODEL_PATH
    Qvq,
}

impl From<Model> for ModelChoice {
    fn from(model: Model) -> Self {
        match model {
            Model::Qwen => ModelChoice::Qwen,
            Model::Qvq => ModelChoice::Qvq,
        }
    }
}

/// Arguments for the `generate` command.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Model to describe images with
    #[arg(short, long, value_enum, default_value = "qwen")]
    pub model: Model,

    /// Directory for JSON records (defaults to OUTPUT_DIR or ./output)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Key prefix to process (defaults to S3_LIST_PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Execute the generate command.
pub async fn execute(args: GenerateArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);

    let mut runner = BatchRunner::from_config(&config, args.model.into()).await;

    let start = Instant::now();
    let progress = indicatif::ProgressBar::hidden();
    let summary = runner
        .run_with(|event| match event {
            BatchEvent::Listed(total) => {
                progress.set_length(total as u64);
                progress.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                progress.set_style(progress_style());
            }
            BatchEvent::Item { key, outcome } => {
                progress.inc(1);
                let status = match outcome {
                    ItemOutcome::Written(_) => "ok",
                    ItemOutcome::Failed(_) => "failed",
                };
                progress.set_message(format!("{status}: {key}"));
            }
        })
        .await?;
    progress.finish_and_clear();

    print_summary(&summary, start.elapsed(), &config);
    Ok(())
}

fn apply_overrides(args: &GenerateArgs, config: &mut Config) {
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.storage.list_prefix = prefix.clone();
    }
}

fn progress_style() -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// Print a formatted summary after the run.
fn print_summary(summary: &BatchSummary, elapsed: std::time::Duration, config: &Config) {
    println!();
    println!("  ====================================");
    println!("               Summary");
    println!("  ====================================");
    println!("    Listed:       {:>8}", summary.listed);
    println!("    Written:      {:>8}", summary.succeeded);
    if summary.failed > 0 {
        println!("    Failed:       {:>8}", summary.failed);
    }
    println!("  ------------------------------------");
    println!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    println!("    Output:       {}", config.output.dir.display());
    println!("  ====================================");
}

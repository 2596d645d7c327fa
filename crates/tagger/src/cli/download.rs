//! The `tagger download` command.

use clap::Args;
use std::path::PathBuf;
use tagger_core::{Config, ModelDownloader};

/// Arguments for the `download` command.
#[derive(Args, Debug, Default)]
pub struct DownloadArgs {
    /// Repository to fetch (defaults to REPO_TO_DOWNLOAD)
    #[arg(long)]
    pub repo: Option<String>,

    /// Destination directory (defaults to PATH_TO_SAVE)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

/// Execute the download command.
pub async fn execute(args: DownloadArgs, config: &Config) -> anyhow::Result<()> {
    let repo = args
        .repo
        .unwrap_or_else(|| config.hub.repo_to_download.clone());
    let dest = args.dest.unwrap_or_else(|| config.hub.path_to_save.clone());

    let downloader = ModelDownloader::new(&config.hub);
    let summary = downloader.download(&repo, &dest).await?;

    println!(
        "{repo}: {} file(s) downloaded, {} already present -> {}",
        summary.downloaded,
        summary.skipped,
        dest.display()
    );
    Ok(())
}

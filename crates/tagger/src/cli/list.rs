//! The `tagger list` command.

use clap::Args;
use tagger_core::{Config, ObjectStore, S3Store};

/// Arguments for the `list` command.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Key prefix (defaults to S3_LIST_PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Also print a presigned URL for each key
    #[arg(long)]
    pub presign: bool,
}

/// Execute the list command.
pub async fn execute(args: ListArgs, config: &Config) -> anyhow::Result<()> {
    let prefix = args
        .prefix
        .unwrap_or_else(|| config.storage.list_prefix.clone());
    let store = S3Store::new(&config.storage).await;

    let keys = store.list_keys(&prefix).await?;
    tracing::info!("{} key(s) under s3://{}/{}", keys.len(), store.bucket(), prefix);

    let expiry = std::time::Duration::from_secs(config.storage.presign_expires_secs);
    for key in keys {
        if args.presign {
            let url = store.presigned_url(&key, expiry).await?;
            println!("{key} -> {url}");
        } else {
            println!("{key}");
        }
    }
    Ok(())
}

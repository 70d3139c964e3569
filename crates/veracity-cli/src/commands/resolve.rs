//! `veracity resolve` — Resolve a DID or dereference a DID URL.

use clap::Args;
use veracity_loader::{DefaultDocumentLoader, DocumentLoader};

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The DID, or a DID URL with a `#fragment` naming a verification method.
    pub did_url: String,
}

pub async fn run(args: &ResolveArgs, config: &CliConfig) -> anyhow::Result<()> {
    let loader = DefaultDocumentLoader::from_config(&config.verifier)?;

    if args.did_url.contains('#') {
        let method = loader.load(&args.did_url).await?;
        println!("{}", serde_json::to_string_pretty(&method.document)?);
        return Ok(());
    }

    let resolution = loader.registry().resolve(&args.did_url).await;
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    if !resolution.is_resolved() {
        anyhow::bail!("could not resolve {}", args.did_url);
    }
    Ok(())
}

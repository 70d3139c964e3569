//! `veracity verify` — Verify credentials, presentations, and tokens.

use clap::Args;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use veracity_core::VerifyOptions;
use veracity_credentials::Verifier;
use veracity_loader::DefaultDocumentLoader;

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// A file path, inline JSON, or a compact token. A JSON array is
    /// verified as a batch.
    pub input: String,

    /// Expected presentation challenge (SD-JWT: key-binding nonce).
    #[arg(long)]
    pub challenge: Option<String>,

    /// Expected presentation domain (SD-JWT: key-binding audience).
    #[arg(long)]
    pub domain: Option<String>,

    /// Override the per-item deadline, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept status lists issued by a different issuer.
    #[arg(long)]
    pub allow_foreign_status_issuer: bool,
}

pub async fn run(args: &VerifyArgs, mut config: CliConfig) -> anyhow::Result<()> {
    if let Some(secs) = args.timeout {
        config.verifier.verification.item_timeout_secs = secs;
    }
    if args.allow_foreign_status_issuer {
        config.verifier.status.verify_matching_issuers = false;
    }

    let input = read_input(&args.input)?;
    let options = VerifyOptions {
        challenge: args.challenge.clone(),
        domain: args.domain.clone(),
    };
    let loader = Arc::new(DefaultDocumentLoader::from_config(&config.verifier)?);
    loader.start();
    let verifier = Verifier::new(loader.clone(), &config.verifier);

    let all_verified = match &input {
        Value::Array(items) => {
            let results = verifier.verify_batch(items, &options).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
            results.iter().all(|r| r.verified)
        }
        single => {
            let result = verifier.verify(single, &options).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            result.verified
        }
    };
    loader.stop();

    if !all_verified {
        anyhow::bail!("verification failed");
    }
    Ok(())
}

/// File contents or the argument itself; JSON when it parses, otherwise a
/// token string.
fn read_input(arg: &str) -> anyhow::Result<Value> {
    let text = if Path::new(arg).is_file() {
        std::fs::read_to_string(arg)?
    } else {
        arg.to_string()
    };
    let text = text.trim();
    Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

//! `veracity decode` — Decode a JWT or SD-JWT without verifying it.

use clap::Args;
use veracity_credentials::token;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// The compact token.
    pub token: String,
}

pub fn run(args: &DecodeArgs) -> anyhow::Result<()> {
    let decoded = token::decode(&args.token)?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

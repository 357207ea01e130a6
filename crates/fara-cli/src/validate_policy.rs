//! `fara validate-policy` — parse a policy file and report errors without
//! starting the HTTP service.

use clap::Args;
use fara_policy::PolicyEngine;

#[derive(Args, Debug)]
pub struct ValidatePolicyArgs {
    /// Path to the policy document. Defaults to `FARA_POLICY_FILE`, else
    /// `policies/default.yaml`.
    #[arg(long)]
    pub path: Option<String>,
}

pub fn run(args: ValidatePolicyArgs) -> anyhow::Result<()> {
    let path = args
        .path
        .or_else(|| std::env::var("FARA_POLICY_FILE").ok())
        .unwrap_or_else(|| "policies/default.yaml".to_string());

    let source = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("failed to read policy file {path}: {e}"))?;
    let engine = PolicyEngine::load(&source)?;
    println!("policy ok: {path} (version {})", engine.policy_version());
    Ok(())
}

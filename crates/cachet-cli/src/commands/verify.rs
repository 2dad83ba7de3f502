//! `cachet verify`: verify a verifiable credential.

use clap::Args;
use serde::Serialize;

use cachet_credentials::VerificationResult;

use crate::client::NodeClient;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential JSON (as string or path to file).
    #[arg(short, long)]
    pub credential: String,
}

#[derive(Serialize)]
struct VerifyRequest {
    credential: serde_json::Value,
}

pub async fn run(args: &VerifyArgs, client: &NodeClient) -> anyhow::Result<()> {
    // Try reading as file first, then as inline JSON
    let json_str = if std::path::Path::new(&args.credential).exists() {
        std::fs::read_to_string(&args.credential)?
    } else {
        args.credential.clone()
    };

    let credential: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| anyhow::anyhow!("invalid credential JSON: {}", e))?;

    let result: VerificationResult = client
        .post("/credentials/verify", &VerifyRequest { credential })
        .await?;

    for outcome in &result.stages {
        let icon = if outcome.passed { "PASS" } else { "FAIL" };
        print!("  [{}] {}", icon, outcome.stage);
        if let Some(ref detail) = outcome.detail {
            print!(": {}", detail);
        }
        println!();
    }
    println!();

    if result.verified {
        println!("Credential is VALID");
        println!("  Issuer:   {}", result.issuer.as_deref().unwrap_or("-"));
        println!("  Subject:  {}", result.subject.as_deref().unwrap_or("-"));
        println!("  Alg:      {}", result.algorithm.as_deref().unwrap_or("-"));
        Ok(())
    } else {
        let failure = result
            .failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown failure".into());
        anyhow::bail!(
            "credential is INVALID ({}): {}",
            failure,
            result.reason.unwrap_or_default()
        )
    }
}

//! `cachet issue`: issue a verifiable credential.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use cachet_credentials::VerifiableCredential;

use crate::client::NodeClient;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Template id (see `cachet templates`).
    #[arg(short, long)]
    pub template: String,

    /// Issuer DID; must be held by the node.
    #[arg(short, long)]
    pub issuer: String,

    /// Subject DID to issue the credential to.
    #[arg(short, long)]
    pub subject: String,

    /// Extra claims as JSON string, merged over the template defaults.
    #[arg(short, long)]
    pub claims: Option<String>,

    /// Write the credential to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct IssueRequest {
    template: String,
    issuer_did: String,
    subject_did: String,
    claims: serde_json::Value,
}

pub async fn run(args: &IssueArgs, client: &NodeClient) -> anyhow::Result<()> {
    let claims: serde_json::Value = match &args.claims {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("invalid claims JSON: {}", e))?,
        None => serde_json::Value::Null,
    };

    let body = IssueRequest {
        template: args.template.clone(),
        issuer_did: args.issuer.clone(),
        subject_did: args.subject.clone(),
        claims,
    };
    let credential: VerifiableCredential = client.post("/credentials/issue", &body).await?;
    let pretty = credential.to_json_pretty()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &pretty)?;
            println!("Credential issued!");
            println!("  ID:       {}", credential.id);
            println!("  Issuer:   {}", credential.issuer);
            println!("  Subject:  {}", credential.subject_id().unwrap_or("-"));
            println!("  Saved to: {}", path.display());
        }
        None => println!("{}", pretty),
    }

    Ok(())
}

//! `cachet identity`: generate a new identity held by the node.

use clap::Args;
use serde::{Deserialize, Serialize};

use cachet_identity::{DidDocument, GenerateParams};

use crate::client::NodeClient;

#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// DID method (key, web).
    #[arg(short, long, default_value = "key")]
    pub method: String,

    /// Location of a web identity as domain[:segment[:id]],
    /// e.g. example.edu:registrar:2024.
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Print the full DID document.
    #[arg(long)]
    pub document: bool,
}

#[derive(Serialize)]
struct GenerateRequest {
    method: String,
    domain: Option<String>,
    path: Option<String>,
    id: Option<String>,
}

#[derive(Deserialize)]
struct IdentityResponse {
    did: String,
    method: String,
    document: DidDocument,
}

fn request(args: &IdentityArgs) -> anyhow::Result<GenerateRequest> {
    let params = match &args.domain {
        Some(triple) => GenerateParams::from_triple(triple)?,
        None => GenerateParams::default(),
    };
    Ok(GenerateRequest {
        method: args.method.clone(),
        domain: params.domain,
        path: params.path,
        id: params.id,
    })
}

pub async fn run(args: &IdentityArgs, client: &NodeClient) -> anyhow::Result<()> {
    let body = request(args)?;
    let data: IdentityResponse = client.post("/identities", &body).await?;

    println!("Identity created!");
    println!("  DID:      {}", data.did);
    println!("  Method:   {}", data.method);
    if let Some(key) = data.document.primary_assertion_method() {
        println!("  Key:      {}", key);
    }
    if args.document {
        println!(
            "Document:\n{}",
            serde_json::to_string_pretty(&data.document)?
        );
    }

    Ok(())
}

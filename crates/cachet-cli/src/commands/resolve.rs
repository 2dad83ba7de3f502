//! `cachet resolve`: resolve a DID to its document.

use clap::Args;

use cachet_identity::DidDocument;

use crate::client::{path_segment, NodeClient};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The DID to resolve.
    pub did: String,
}

pub async fn run(args: &ResolveArgs, client: &NodeClient) -> anyhow::Result<()> {
    let path = format!("/dids/{}", path_segment(&args.did));
    let document: DidDocument = client.get(&path).await?;

    println!("DID: {}", document.id);
    println!("Document:\n{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}

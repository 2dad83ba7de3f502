//! `cachet identities`: list identities held by the node.

use serde::Deserialize;

use crate::client::NodeClient;

#[derive(Deserialize)]
struct IdentitySummary {
    did: String,
    method: String,
}

#[derive(Deserialize)]
struct IdentitiesResponse {
    identities: Vec<IdentitySummary>,
    count: usize,
}

pub async fn run(client: &NodeClient) -> anyhow::Result<()> {
    let data: IdentitiesResponse = client.get("/identities").await?;

    if data.identities.is_empty() {
        println!("No identities held by this node.");
        println!("Create one with: cachet identity --method key");
        return Ok(());
    }

    println!("Identities ({}):", data.count);
    for identity in &data.identities {
        println!("  [{}] {}", identity.method, identity.did);
    }

    Ok(())
}

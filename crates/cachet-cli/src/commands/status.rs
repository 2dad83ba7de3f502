//! `cachet status`: query the status of a running Cachet node.

use serde::Deserialize;

use crate::client::NodeClient;

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    identities: usize,
    templates: usize,
    history_entries: usize,
    history_capacity: usize,
    methods: Vec<String>,
}

pub async fn run(client: &NodeClient) -> anyhow::Result<()> {
    let status: StatusResponse = client.get("/status").await?;

    println!("Node Status:");
    println!("  Version:     {}", status.version);
    println!("  Uptime:      {}s", status.uptime_secs);
    println!("  Methods:     {}", status.methods.join(", "));
    println!("  Identities:  {}", status.identities);
    println!("  Templates:   {}", status.templates);
    println!(
        "  History:     {}/{}",
        status.history_entries, status.history_capacity
    );

    Ok(())
}

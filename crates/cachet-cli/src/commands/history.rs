//! `cachet history`: list issued credentials, newest first.

use clap::Args;
use serde::Deserialize;

use cachet_credentials::{HistoryEntry, HistoryFilter};

use crate::client::NodeClient;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Only credentials from this issuer DID.
    #[arg(long)]
    pub issuer: Option<String>,

    /// Only credentials about this subject DID.
    #[arg(long)]
    pub subject: Option<String>,

    /// Only credentials of this type.
    #[arg(short = 't', long = "type")]
    pub credential_type: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    entries: Vec<HistoryEntry>,
    count: usize,
}

pub async fn run(args: &HistoryArgs, client: &NodeClient) -> anyhow::Result<()> {
    let filter = HistoryFilter {
        issuer: args.issuer.clone(),
        subject: args.subject.clone(),
        credential_type: args.credential_type.clone(),
    };
    let data: HistoryResponse = client.get_with_query("/history", &filter).await?;

    if data.entries.is_empty() {
        println!("No credentials in history.");
        return Ok(());
    }

    println!("History ({}):", data.count);
    for entry in &data.entries {
        println!("  {}  {}", entry.recorded_at, entry.credential_id);
        println!("    Type:     {}", entry.types.join(", "));
        println!("    Issuer:   {}", entry.issuer);
        println!("    Subject:  {}", entry.subject);
    }

    Ok(())
}

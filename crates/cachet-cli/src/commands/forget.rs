//! `cachet forget`: remove a credential from history.

use clap::Args;

use cachet_credentials::HistoryEntry;

use crate::client::{path_segment, NodeClient};

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Credential id (urn:uuid:...).
    pub id: String,
}

pub async fn run(args: &ForgetArgs, client: &NodeClient) -> anyhow::Result<()> {
    let path = format!("/history/{}", path_segment(&args.id));
    let entry: HistoryEntry = client.delete(&path).await?;
    println!("Removed {} ({})", entry.credential_id, entry.types.join(", "));
    Ok(())
}

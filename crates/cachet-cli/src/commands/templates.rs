//! `cachet templates`: list credential templates.

use serde::Deserialize;

use cachet_credentials::CredentialTemplate;

use crate::client::NodeClient;

#[derive(Deserialize)]
struct TemplatesResponse {
    templates: Vec<CredentialTemplate>,
}

pub async fn run(client: &NodeClient) -> anyhow::Result<()> {
    let data: TemplatesResponse = client.get("/templates").await?;

    for template in &data.templates {
        println!("{} ({})", template.id, template.name);
        println!("  {}", template.description);
        println!("  Types:  {}", template.full_types().join(", "));
        for claim in &template.claims {
            let marker = if claim.required { "*" } else { " " };
            println!("   {} {:<16} {:?}", marker, claim.name, claim.value_type);
        }
        println!();
    }

    Ok(())
}

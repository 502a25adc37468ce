//! `ocimeta created` command.

use clap::Args;

use ocimeta_client::{ImageReference, RegistryClient};

#[derive(Args)]
pub struct CreatedArgs {
    /// Image reference (e.g., "alpine", "ghcr.io/org/image:tag")
    pub image: String,

    /// Allow communication with an insecure registry
    #[arg(long)]
    pub insecure: bool,
}

pub async fn execute(
    client: &RegistryClient,
    args: &CreatedArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = ImageReference::parse(&args.image)?;
    let config = client.image_config(&reference).await?;

    let created = config.created_date().ok_or("no creation date found")?;
    println!("{created}");

    Ok(())
}

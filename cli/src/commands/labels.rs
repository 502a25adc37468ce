//! `ocimeta labels` command.

use clap::{Args, ValueEnum};

use ocimeta_client::{ImageReference, RegistryClient};

use crate::output;

#[derive(Args)]
pub struct LabelsArgs {
    /// Image reference to inspect
    pub image: String,

    /// Allow communication with an insecure registry
    #[arg(long)]
    pub insecure: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub async fn execute(
    client: &RegistryClient,
    args: &LabelsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = ImageReference::parse(&args.image)?;
    let config = client.image_config(&reference).await?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.config.labels)?);
        }
        OutputFormat::Table => {
            let mut labels: Vec<_> = config.config.labels.iter().collect();
            labels.sort();

            let mut table = output::new_table(&["LABEL", "VALUE"]);
            for (key, value) in labels {
                table.add_row([key.as_str(), value.as_str()]);
            }
            println!("{table}");
        }
    }

    Ok(())
}

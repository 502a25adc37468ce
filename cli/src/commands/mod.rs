//! CLI command definitions and dispatch.

mod created;
mod labels;

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ocimeta_client::{CredentialStore, RegistryClient};

/// ocimeta — query remote container image metadata.
#[derive(Parser)]
#[command(name = "ocimeta", version, about)]
pub struct Cli {
    /// Read registry credentials from a .netrc file (has precedence over
    /// --netrc-stdin)
    #[arg(long, global = true)]
    pub netrc_file: Option<PathBuf>,

    /// Read registry credentials in .netrc format from stdin
    #[arg(long, global = true)]
    pub netrc_stdin: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Show the creation date for an image
    Created(created::CreatedArgs),
    /// Show the labels of an image
    Labels(labels::LabelsArgs),
}

/// Build a registry client from the global credential flags.
pub(crate) fn build_client(
    cli: &Cli,
    insecure: bool,
) -> Result<RegistryClient, Box<dyn std::error::Error>> {
    let credentials = if let Some(ref path) = cli.netrc_file {
        Some(CredentialStore::from_file(path)?)
    } else if cli.netrc_stdin {
        let mut contents = String::new();
        std::io::stdin().read_to_string(&mut contents)?;
        Some(CredentialStore::from_text(&contents)?)
    } else {
        None
    };

    let mut builder = RegistryClient::builder().insecure(insecure);
    if let Some(store) = credentials {
        builder = builder.credentials(store);
    }

    Ok(builder.build()?)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Created(args) => {
            let client = build_client(&cli, args.insecure)?;
            created::execute(&client, args).await
        }
        Command::Labels(args) => {
            let client = build_client(&cli, args.insecure)?;
            labels::execute(&client, args).await
        }
    }
}

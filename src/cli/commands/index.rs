//! Index command implementation.

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::error::ProvisionError;
use crate::models::{Config, IndexDescriptor, OutputFormat};
use crate::services::{IndexProvisioner, IndexReady, create_backend};
use crate::utils::str_to_bool;

#[derive(Debug, Subcommand)]
pub enum IndexCommand {
    /// Check that the configured index exists, optionally creating it
    Ensure {
        /// Index name (defaults to [vector_index].index_name)
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Create the index when it is missing
        #[arg(long)]
        create: bool,
    },

    /// Delete an index and all of its records
    Delete {
        /// Index name (defaults to [vector_index].index_name)
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// List indexes visible to the configured credentials
    List,
}

pub async fn handle_index(cmd: IndexCommand, format: OutputFormat, verbose: bool) -> Result<()> {
    match cmd {
        IndexCommand::Ensure { name, create } => handle_ensure(name, create, format, verbose).await,
        IndexCommand::Delete { name, force } => handle_delete(name, force, format).await,
        IndexCommand::List => handle_list(format).await,
    }
}

pub(crate) fn descriptor_for(config: &Config, name: Option<String>) -> IndexDescriptor {
    let mut descriptor = IndexDescriptor::from_config(&config.vector_index);
    if let Some(name) = name {
        descriptor.name = name;
    }
    descriptor
}

async fn handle_ensure(
    name: Option<String>,
    create: bool,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let descriptor = descriptor_for(&config, name);

    if verbose {
        eprintln!(
            "Index: {} (dimension {}, metric {}, {}/{})",
            descriptor.name,
            descriptor.dimension,
            descriptor.metric,
            descriptor.spec.cloud,
            descriptor.spec.region
        );
    }

    let service = create_backend(&config.vector_index).context("vector index unavailable")?;
    let provisioner = IndexProvisioner::new(service);

    let message = match provisioner.ensure_index(&descriptor, create).await {
        Ok(IndexReady::Existing) => format!("Index '{}' already exists.", descriptor.name),
        Ok(IndexReady::Created) => format!(
            "Index '{}' created. It may take a moment before it accepts data.",
            descriptor.name
        ),
        Err(ProvisionError::NotFound { index }) => {
            anyhow::bail!("index '{index}' does not exist (use --create to create it)")
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", formatter.format_message(&message));
    Ok(())
}

async fn handle_delete(name: Option<String>, force: bool, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let descriptor = descriptor_for(&config, name);

    if !force {
        println!(
            "This will delete index '{}' and ALL of its records. Continue? [y/N]",
            descriptor.name
        );
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !str_to_bool(&input) {
            println!("{}", formatter.format_message("Cancelled."));
            return Ok(());
        }
    }

    let service = create_backend(&config.vector_index).context("vector index unavailable")?;
    service
        .delete_index(&descriptor.name)
        .await
        .with_context(|| format!("failed to delete index '{}'", descriptor.name))?;

    println!(
        "{}",
        formatter.format_message(&format!("Index '{}' has been deleted.", descriptor.name))
    );
    Ok(())
}

async fn handle_list(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let service = create_backend(&config.vector_index).context("vector index unavailable")?;
    let mut indexes = service
        .list_indexes()
        .await
        .context("failed to list indexes")?;
    indexes.sort();

    print!(
        "{}",
        formatter.format_index_list(&indexes, &config.vector_index.index_name)
    );
    Ok(())
}

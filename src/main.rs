//! Linkstash main entry point
//!
//! This is the command-line consumer of the enrichment pipeline: it saves
//! new links, lists stored links with progressively-enriched metadata, and
//! deletes links locally.

use clap::{Parser, Subcommand};
use image::GenericImageView;
use linkstash::config::{load_config, Config};
use linkstash::enrich::{EnrichedLink, EnrichmentPipeline, LinkIcon};
use linkstash::metadata::MetadataFetcher;
use linkstash::resolver::{normalize_raw_url, AliasResolver, ResolverError};
use linkstash::storage::{open_storage, LinkStore, SqliteStore};
use linkstash::LinkError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Linkstash: save, shorten, and browse links
///
/// Linkstash keeps local records of aliases held by a remote URL-shortening
/// service and enriches them with page titles and favicons for display.
#[derive(Parser, Debug)]
#[command(name = "linkstash")]
#[command(version = "1.0.0")]
#[command(about = "Save, shorten, and browse links", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shorten a URL and save the resulting link locally
    Add {
        /// The URL to shorten (scheme optional, https assumed)
        url: String,
    },

    /// List stored links, enriched with titles and favicons
    List,

    /// Resolve one alias and preview its title and favicon
    Show {
        /// The alias to resolve
        server_id: String,
    },

    /// Delete a stored link by its alias
    Remove {
        /// The alias to delete
        server_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkstash=warn"),
            1 => EnvFilter::new("linkstash=info,warn"),
            2 => EnvFilter::new("linkstash=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), LinkError> {
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    let timeout = Duration::from_secs(config.metadata.request_timeout_secs);
    let resolver = AliasResolver::new(&config.server.base_url, timeout)?;
    let metadata = MetadataFetcher::new(&config.metadata)?;
    let store = open_storage(Path::new(&config.storage.database_path))?;

    match cli.command {
        Command::Add { url } => handle_add(store, &resolver, &url).await,
        Command::List => {
            handle_list(store, resolver, metadata, config.metadata.icon_size).await
        }
        Command::Show { server_id } => {
            handle_show(&resolver, &metadata, config.metadata.icon_size, &server_id).await
        }
        Command::Remove { server_id } => handle_remove(store, &server_id),
    }
}

/// Handles `add`: normalize input, create the alias remotely, save locally
async fn handle_add(
    mut store: SqliteStore,
    resolver: &AliasResolver,
    raw_url: &str,
) -> Result<(), LinkError> {
    let normalized =
        normalize_raw_url(raw_url).ok_or(LinkError::Resolver(ResolverError::InvalidUrl))?;

    let record = resolver.create(normalized.as_str()).await?;
    let resolved = resolver.resolve(&record.server_id).await?;
    store.save(&record)?;

    println!("Saved {} -> {}", record.server_id, resolved.url);
    Ok(())
}

/// Handles `list`: run the enrichment pipeline and print the settled table
///
/// Snapshots are upserted by alias as they arrive, so a final snapshot
/// replaces its partial predecessor in place.
async fn handle_list(
    store: SqliteStore,
    resolver: AliasResolver,
    metadata: MetadataFetcher,
    icon_size: u32,
) -> Result<(), LinkError> {
    let pipeline =
        EnrichmentPipeline::new(Arc::new(Mutex::new(store)), resolver, metadata, icon_size);
    let mut stream = pipeline.enrich_all().await?;

    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<EnrichedLink> = Vec::new();

    while let Some(snapshot) = stream.recv().await {
        let link = snapshot.into_link();
        match index_by_id.get(&link.record.server_id) {
            Some(&idx) => rows[idx] = link,
            None => {
                index_by_id.insert(link.record.server_id.clone(), rows.len());
                rows.push(link);
            }
        }
    }

    if rows.is_empty() {
        println!("No links stored.");
        return Ok(());
    }

    for link in &rows {
        let title = link.title.as_deref().unwrap_or(&link.url);
        println!(
            "{}  {}  [{}]",
            link.record.server_id,
            title,
            describe_icon(link.icon.as_ref())
        );
        println!("        {}", link.url);
    }

    Ok(())
}

/// Handles `show`: resolve one alias and preview its metadata
async fn handle_show(
    resolver: &AliasResolver,
    metadata: &MetadataFetcher,
    icon_size: u32,
    server_id: &str,
) -> Result<(), LinkError> {
    let resolved = resolver.resolve(server_id).await?;
    println!("{} -> {}", resolved.server_id, resolved.url);

    if let Ok(site_url) = Url::parse(&resolved.url) {
        let (title, favicon) = tokio::join!(
            metadata.fetch_page_title(&site_url),
            metadata.fetch_favicon(&site_url, icon_size),
        );

        if let Some(title) = title {
            println!("Title: {}", title);
        }
        match favicon.and_then(|bytes| image::load_from_memory(&bytes).ok()) {
            Some(icon) => println!("Favicon: {}", describe_icon(Some(&LinkIcon::Image(icon)))),
            None => println!("Favicon: none"),
        }
    }

    Ok(())
}

/// Handles `remove`: delete a stored link by alias
fn handle_remove(mut store: SqliteStore, server_id: &str) -> Result<(), LinkError> {
    store.delete(server_id)?;
    println!("Removed {}", server_id);
    Ok(())
}

/// Short human-readable icon description for list output
fn describe_icon(icon: Option<&LinkIcon>) -> String {
    match icon {
        None => "pending".to_string(),
        Some(LinkIcon::Placeholder(name)) => name.to_string(),
        Some(LinkIcon::Image(img)) => format!("{}x{} icon", img.width(), img.height()),
    }
}

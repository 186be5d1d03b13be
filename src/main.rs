mod cli;

use rentpv::{
    config::{self, Config},
    photos::UploadMetadata,
    server::{self, AppContext},
};
use rentpv_common::paths::image_content_type;
use rentpv_db::pool::{init_pool, DbPool};
use rentpv_db::queries::{agents, listings, photos};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{AgentCommands, Cli, Commands, ListingCommands, PhotoCommands};
use std::path::Path;

/// Load config and open (creating if needed) the database under its data dir.
fn open_store(config_path: Option<&Path>) -> Result<(Config, DbPool)> {
    let config = config::load_config_or_default(config_path)?;

    std::fs::create_dir_all(&config.storage.data_dir)
        .with_context(|| format!("Failed to create data dir {:?}", config.storage.data_dir))?;

    let db_path = config.storage.db_path();
    let db_path_str = db_path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path_str);
    let db_pool = init_pool(&db_path_str)?;

    Ok((config, db_pool))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let (mut config, db_pool) = open_store(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting rentpv server");
    tracing::info!(
        "Data in {:?}, photos published at {}",
        config.storage.data_dir,
        config.storage.public_base_url
    );

    server::start_server(config, db_pool).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rentpv=trace,rentpv_db=debug,rentpv_common=debug,tower_http=debug".to_string()
        } else {
            "rentpv=debug,rentpv_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Agent { command } => agent_command(command, cli.config.as_deref()),
        Commands::Listing { command } => listing_command(command, cli.config.as_deref()),
        Commands::Photos { command } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(photo_command(command, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("rentpv {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn agent_command(command: AgentCommands, config_path: Option<&Path>) -> Result<()> {
    let (_, db_pool) = open_store(config_path)?;
    let conn = db_pool.get()?;

    match command {
        AgentCommands::Create {
            email,
            full_name,
            phone,
            company,
        } => {
            let agent = agents::create_agent(
                &conn,
                &email,
                &full_name,
                phone.as_deref(),
                company.as_deref(),
            )?;
            println!("{}", agent.id);
        }
    }

    Ok(())
}

fn listing_command(command: ListingCommands, config_path: Option<&Path>) -> Result<()> {
    let (_, db_pool) = open_store(config_path)?;
    let conn = db_pool.get()?;

    match command {
        ListingCommands::Create { agent_id, title } => {
            let listing = listings::create_listing(&conn, agent_id, &title)?;
            println!("{}", listing.id);
        }
        ListingCommands::Show { listing_id } => {
            let listing = listings::get_listing(&conn, listing_id)?
                .with_context(|| format!("Listing {} not found", listing_id))?;
            let count = photos::list_photos_for_listing(&conn, listing_id)?.len();

            println!("Listing: {}", listing.id);
            println!("  Title: {}", listing.title);
            println!("  Agent: {}", listing.agent_id);
            println!("  Status: {}", listing.status);
            println!("  Photos: {}", count);
            println!("  Cover: {}", listing.cover_url.as_deref().unwrap_or("(none)"));
        }
        ListingCommands::List { agent_id } => {
            for listing in listings::list_listings_for_agent(&conn, agent_id)? {
                println!("{}  [{}]  {}", listing.id, listing.status, listing.title);
            }
        }
        ListingCommands::SetStatus { listing_id, status } => {
            listings::set_status(&conn, listing_id, status)?;
            println!("{} is now {}", listing_id, status);
        }
    }

    Ok(())
}

async fn photo_command(command: PhotoCommands, config_path: Option<&Path>) -> Result<()> {
    let (config, db_pool) = open_store(config_path)?;
    let ctx = AppContext::new(config, db_pool);

    match command {
        PhotoCommands::List { listing_id } => {
            let owner = {
                let conn = ctx.db_pool.get()?;
                listings::listing_owner(&conn, listing_id)?
                    .with_context(|| format!("Listing {} not found", listing_id))?
            };
            let manager = ctx.photo_manager(owner);
            let list = manager.photos(listing_id).await?;
            if list.is_empty() {
                println!("No photos");
            }
            for photo in &list {
                let marker = if photo.is_cover() { "*" } else { " " };
                let url = manager.resolve_url(photo);
                let url = if url.is_empty() { "(unresolved)" } else { url.as_str() };
                println!("{}{:>3}. {}  {}", marker, photo.display_order, photo.id, url);
            }
        }
        PhotoCommands::Add {
            agent_id,
            listing_id,
            file,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {:?}", file))?;
            let meta = UploadMetadata {
                file_name: file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content_type: image_content_type(&file)
                    .unwrap_or("application/octet-stream")
                    .to_string(),
                size: data.len() as u64,
            };
            let photo = ctx
                .photo_manager(agent_id)
                .add(listing_id, data.into(), meta)
                .await?;
            println!("{} (order {})", photo.id, photo.display_order);
        }
        PhotoCommands::Remove { agent_id, photo_id } => {
            let manager = ctx.photo_manager(agent_id);
            let photo = manager
                .photo(photo_id)
                .await?
                .with_context(|| format!("Photo {} not found", photo_id))?;
            manager.remove(&photo).await?;
            println!("Removed {}", photo_id);
        }
        PhotoCommands::Reorder {
            agent_id,
            listing_id,
            moved,
            target,
        } => {
            ctx.photo_manager(agent_id)
                .reorder(listing_id, moved, target)
                .await?;
            println!("Moved {} before {}", moved, target);
        }
        PhotoCommands::Cover {
            agent_id,
            listing_id,
            photo_id,
        } => {
            ctx.photo_manager(agent_id)
                .make_cover(listing_id, photo_id)
                .await?;
            println!("Cover is now {}", photo_id);
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data dir: {:?}", config.storage.data_dir);
    println!("  Public URL: {}", config.storage.public_base_url);
    println!("  Default bucket: {}", config.storage.default_bucket);
    println!(
        "  Upload limit: {} bytes ({})",
        config.photos.max_upload_bytes,
        config.photos.allowed_content_types.join(", ")
    );
}

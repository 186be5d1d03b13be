use clap::{Parser, Subcommand};
use rentpv_common::{AgentId, ListingId, ListingStatus, PhotoId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rentpv")]
#[command(author, version, about = "Property listing backend with ordered listing photos")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage agents
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Manage listings
    Listing {
        #[command(subcommand)]
        command: ListingCommands,
    },

    /// Manage listing photos
    Photos {
        #[command(subcommand)]
        command: PhotoCommands,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Register a new agent and print its id
    Create {
        email: String,

        full_name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        company: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ListingCommands {
    /// Create a draft listing owned by an agent
    Create { agent_id: AgentId, title: String },

    /// Show a listing and its cover
    Show { listing_id: ListingId },

    /// List an agent's listings
    List { agent_id: AgentId },

    /// Change a listing's status (draft, active, inactive)
    SetStatus {
        listing_id: ListingId,
        status: ListingStatus,
    },
}

#[derive(Subcommand)]
pub enum PhotoCommands {
    /// List a listing's photos in display order
    List { listing_id: ListingId },

    /// Upload an image file and append it to a listing
    Add {
        agent_id: AgentId,
        listing_id: ListingId,
        /// Image file (content type is inferred from the extension)
        file: PathBuf,
    },

    /// Delete a photo
    Remove { agent_id: AgentId, photo_id: PhotoId },

    /// Move a photo immediately before another one
    Reorder {
        agent_id: AgentId,
        listing_id: ListingId,
        moved: PhotoId,
        target: PhotoId,
    },

    /// Make a photo the listing's cover
    Cover {
        agent_id: AgentId,
        listing_id: ListingId,
        photo_id: PhotoId,
    },
}

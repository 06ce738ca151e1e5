mod commands;

use clap::{Parser, Subcommand};
use permastore_core::config::StoreConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "permastore")]
#[command(about = "Checkpointed uploads to permanent storage, plus IPFS pass-through")]
#[command(version)]
struct Cli {
    /// Path to the permastore config directory (default: ~/.permastore)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize permastore configuration
    Init,

    /// Upload a file as a tagged storage transaction
    Upload {
        /// File to upload
        path: PathBuf,
        /// Tag attached to the transaction, as name=value (repeatable)
        #[arg(long = "tag", value_name = "NAME=VALUE")]
        tags: Vec<String>,
        /// Checkpoint after this many chunks instead of finishing the pass
        #[arg(long)]
        checkpoint_every: Option<usize>,
    },

    /// Resume a checkpointed upload of the same file
    Resume {
        /// File whose upload was interrupted
        path: PathBuf,
    },

    /// Download a stored transaction's data
    Download {
        /// Transaction identifier
        id: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show a stored transaction's tags
    Tags {
        /// Transaction identifier
        id: String,
    },

    /// Add a file to IPFS
    IpfsAdd {
        /// File to add
        path: PathBuf,
    },

    /// Retrieve IPFS content by hash
    IpfsCat {
        /// Content hash
        cid: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.config_dir {
        Some(dir) => dir,
        None => StoreConfig::default_base_dir()?,
    };

    match cli.command {
        Commands::Init => commands::init::run(&base_dir),
        Commands::Upload {
            path,
            tags,
            checkpoint_every,
        } => commands::upload::run(&path, &tags, checkpoint_every, &base_dir).await,
        Commands::Resume { path } => commands::resume::run(&path, &base_dir).await,
        Commands::Download { id, out } => {
            commands::retrieve::download(&id, out.as_deref(), &base_dir).await
        }
        Commands::Tags { id } => commands::retrieve::tags(&id, &base_dir).await,
        Commands::IpfsAdd { path } => commands::ipfs::add(&path, &base_dir).await,
        Commands::IpfsCat { cid, out } => {
            commands::ipfs::cat(&cid, out.as_deref(), &base_dir).await
        }
        Commands::Config => commands::config::run(&base_dir),
    }
}

//! Clap option structs for the ferry client and the ferryd daemon

use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "ferryd",
    version,
    about = "Ferry daemon - serves directory trees to ferry clients"
)]
pub struct ServerOpts {
    /// Listen port
    #[arg(short = 'p', long)]
    pub port: u16,

    /// Worker pool size (0 = one per CPU)
    #[arg(short = 's', long = "pool-size")]
    pub pool_size: usize,

    /// Task queue capacity
    #[arg(short = 'q', long = "queue-capacity")]
    pub queue_capacity: usize,

    /// Transfer block size in bytes
    #[arg(short = 'b', long = "block-size")]
    pub block_size: usize,

    /// Root directory served to clients
    #[arg(long, default_value = "./test_files")]
    pub root: PathBuf,

    /// Bind address (the port is appended)
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Append timestamped event log entries to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Parser)]
#[command(
    name = "ferry",
    version,
    about = "Ferry client - replicates a directory tree from a ferryd server"
)]
pub struct ClientOpts {
    /// Server address
    #[arg(short = 'i', long = "server-ip")]
    pub server_ip: String,

    /// Server port
    #[arg(short = 'p', long)]
    pub port: u16,

    /// Directory to replicate ("." requests the server's entire root)
    #[arg(short = 'd', long)]
    pub directory: String,

    /// Local destination root
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,

    /// Show a progress bar while receiving
    #[arg(long)]
    pub progress: bool,

    /// Record received files to a JSONL journal at the destination
    #[arg(long)]
    pub journal: bool,

    /// Append timestamped event log entries to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

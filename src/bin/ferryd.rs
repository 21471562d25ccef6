//! Ferry daemon - accepts connections and streams requested trees back

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use ferry::cli::ServerOpts;
use ferry::logger::{Logger, NoopLogger, TextLogger};
use ferry::server::{self, ServerCtx};
use ferry::worker;

fn main() -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    let opts = ServerOpts::parse();

    if opts.block_size == 0 {
        anyhow::bail!("block size must be at least 1");
    }
    if !opts.root.exists() {
        anyhow::bail!("root directory does not exist: {}", opts.root.display());
    }
    if !opts.root.is_dir() {
        anyhow::bail!("root path is not a directory: {}", opts.root.display());
    }
    let root = std::fs::canonicalize(&opts.root)
        .with_context(|| format!("canonicalize root {}", opts.root.display()))?;

    let pool_size = if opts.pool_size == 0 {
        num_cpus::get()
    } else {
        opts.pool_size
    };

    println!("Starting ferryd:");
    println!("  Root: {}", root.display());
    println!("  Bind: {}:{}", opts.bind, opts.port);
    println!("  Workers: {pool_size}");
    println!("  Queue capacity: {}", opts.queue_capacity);
    println!("  Block size: {}", opts.block_size);

    let logger: Arc<dyn Logger> = if let Some(ref p) = opts.log_file {
        match TextLogger::new(p) {
            Ok(l) => Arc::new(l),
            Err(_) => Arc::new(NoopLogger),
        }
    } else {
        Arc::new(NoopLogger)
    };

    let ctx = Arc::new(ServerCtx::new(
        root,
        opts.block_size,
        opts.queue_capacity,
        logger,
    ));

    worker::spawn_workers(pool_size, Arc::clone(&ctx));

    let bind = format!("{}:{}", opts.bind, opts.port);
    server::serve(&bind, ctx)
}

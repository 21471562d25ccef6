//! Ferry client - replicates a directory tree from a ferryd server

use anyhow::{Context, Result};
use clap::Parser;
use std::net::TcpStream;
use std::sync::Arc;

use ferry::cli::ClientOpts;
use ferry::client;
use ferry::journal::Journal;
use ferry::logger::{Logger, NoopLogger, TextLogger};

fn main() -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        std::process::exit(130);
    })
    .expect("Error setting Ctrl-C handler");

    let opts = ClientOpts::parse();

    // Choose logger once; zero overhead with NoopLogger
    let logger: Arc<dyn Logger> = if let Some(ref p) = opts.log_file {
        match TextLogger::new(p) {
            Ok(l) => Arc::new(l),
            Err(_) => Arc::new(NoopLogger),
        }
    } else {
        Arc::new(NoopLogger)
    };

    let addr = format!("{}:{}", opts.server_ip, opts.port);
    eprintln!("connecting to {addr}...");
    let stream = TcpStream::connect(&addr).with_context(|| format!("connect {addr}"))?;
    eprintln!("connected");

    let journal = opts.journal.then(|| Journal::new(&opts.dest));
    let stats = client::replicate(
        stream,
        &opts.directory,
        &opts.dest,
        journal.as_ref(),
        &*logger,
        opts.progress,
    )?;

    eprintln!(
        "transfer complete: {} files, {} bytes under {}",
        stats.files,
        stats.bytes,
        opts.dest.display()
    );
    Ok(())
}

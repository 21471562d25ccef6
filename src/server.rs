//! Shared server context and the accept loop

use anyhow::{Context, Result};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::logger::Logger;
use crate::queue::TaskQueue;
use crate::session;

/// Everything the acceptor, coordinators and workers share. Constructed
/// once at startup and passed around by `Arc`; there are no globals.
pub struct ServerCtx {
    pub root: PathBuf,
    pub block_size: usize,
    pub queue: TaskQueue,
    pub logger: Arc<dyn Logger>,
}

impl ServerCtx {
    pub fn new(
        root: PathBuf,
        block_size: usize,
        queue_capacity: usize,
        logger: Arc<dyn Logger>,
    ) -> Self {
        ServerCtx {
            root,
            block_size,
            queue: TaskQueue::new(queue_capacity),
            logger,
        }
    }
}

/// Accept connections forever, spawning one coordinator thread per client.
/// No admission control; accept errors are logged and do not stop the loop.
pub fn serve(bind: &str, ctx: Arc<ServerCtx>) -> Result<()> {
    let listener = TcpListener::bind(bind).with_context(|| format!("bind {bind}"))?;
    eprintln!("ferryd listening on {} root={}", bind, ctx.root.display());
    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                eprintln!("conn from {peer}");
                let ctx = Arc::clone(&ctx);
                thread::spawn(move || session::run_session(stream, ctx));
            }
            Err(e) => {
                eprintln!("accept error: {e}");
            }
        }
    }
    Ok(())
}

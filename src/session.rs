//! Per-connection session: request parsing, scan, task fan-out, teardown

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::queue::Task;
use crate::reader::ByteReader;
use crate::scan::{scan_tree, wire_name};
use crate::server::ServerCtx;
use crate::wire;

/// Connection context shared between the coordinator and the workers.
/// Holding `writer` is the exclusive right to write to the socket, so
/// headers and chunks of one connection never interleave. The context is
/// created before any task for the connection is enqueued and lives until
/// the last holder drops its `Arc`.
pub struct SessionConn {
    pub id: Uuid,
    pub peer: String,
    writer: Mutex<TcpStream>,
}

impl SessionConn {
    pub fn new(stream: TcpStream, peer: String) -> Self {
        SessionConn {
            id: Uuid::new_v4(),
            peer,
            writer: Mutex::new(stream),
        }
    }

    pub fn lock_writer(&self) -> MutexGuard<'_, TcpStream> {
        self.writer.lock()
    }

    /// Abort the session: both ends of the socket are shut down, so the
    /// client observes end-of-stream instead of waiting forever.
    pub fn shutdown(&self) {
        let _ = self.lock_writer().shutdown(Shutdown::Both);
    }
}

/// Resolve a requested path against the server's base root. Trailing `/`
/// and `.` characters are stripped first, so "." (the root alias) and "./"
/// resolve to the root itself.
pub fn resolve_request(root: &Path, request: &str) -> PathBuf {
    let trimmed = request.trim_end_matches('/').trim_end_matches('.');
    if trimmed.is_empty() {
        root.to_path_buf()
    } else {
        root.join(trimmed)
    }
}

/// Entry point of a coordinator thread, one per accepted connection. All
/// failures are session-local: they are logged and abort this connection
/// only.
pub fn run_session(stream: TcpStream, ctx: Arc<ServerCtx>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    if let Err(e) = serve_session(stream, &peer, &ctx) {
        eprintln!("session {peer}: aborted: {e:#}");
        ctx.logger.error("session", Path::new(&peer), &format!("{e:#}"));
    }
}

fn serve_session(stream: TcpStream, peer: &str, ctx: &Arc<ServerCtx>) -> Result<()> {
    let started = Instant::now();
    let mut reader = ByteReader::new(stream.try_clone().context("clone connection")?);

    let request = wire::decode_request(&mut reader)?;
    let dir = resolve_request(&ctx.root, &request);
    eprintln!("session {peer}: scanning {}", dir.display());

    // An unopenable directory is not an error to the client; it simply
    // receives a file count of zero.
    let files: Vec<(PathBuf, String)> = scan_tree(&dir)
        .into_iter()
        .filter_map(|e| wire_name(&ctx.root, &e.path).map(|name| (e.path, name)))
        .collect();

    // The write lock must exist before the first task referencing this
    // connection can be enqueued.
    let conn = Arc::new(SessionConn::new(stream, peer.to_string()));
    ctx.logger
        .session_start(conn.id, peer, &request, files.len());

    conn.lock_writer()
        .write_all(&wire::encode_file_count(files.len() as u32))
        .context("send file count")?;

    for (path, name) in files {
        ctx.queue.push(Task {
            conn: Arc::clone(&conn),
            path,
            name,
        });
    }

    // Block until the client acks completion with a single byte. A client
    // that disconnects instead of acking still ends the session cleanly.
    let _ = reader.next().context("await completion ack")?;

    eprintln!("session {peer}: completed, closing");
    ctx.logger.session_done(conn.id, started.elapsed().as_secs_f64());

    // Dropping our Arc releases the write lock once in-flight workers are
    // done with theirs; the sockets close with the last clone.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_resolves_to_the_root() {
        let root = Path::new("/srv/base");
        assert_eq!(resolve_request(root, "."), root);
    }

    #[test]
    fn plain_paths_join_beneath_the_root() {
        let root = Path::new("/srv/base");
        assert_eq!(resolve_request(root, "mydir"), root.join("mydir"));
        assert_eq!(
            resolve_request(root, "mydir/sub"),
            root.join("mydir/sub")
        );
    }

    #[test]
    fn trailing_dots_and_separators_are_stripped() {
        let root = Path::new("/srv/base");
        assert_eq!(resolve_request(root, "mydir."), root.join("mydir"));
        assert_eq!(resolve_request(root, "mydir/"), root.join("mydir"));
        assert_eq!(resolve_request(root, "./"), root);
    }
}

//! Client-side tree replication from the framed stream
//!
//! Placement comes entirely from the name embedded in each file header;
//! arrival order is meaningless because server workers drain the queue in
//! parallel.

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::journal::{EntryStatus, Journal, JournalEntry};
use crate::logger::Logger;
use crate::reader::ByteReader;
use crate::wire;

#[derive(Debug, Default, Clone, Copy)]
pub struct ClientStats {
    pub files: u64,
    pub bytes: u64,
}

/// Request `directory` from the server on `stream` and rebuild it beneath
/// `dest`. Sends the completion ack once every announced file has arrived.
pub fn replicate(
    stream: TcpStream,
    directory: &str,
    dest: &Path,
    journal: Option<&Journal>,
    logger: &dyn Logger,
    show_progress: bool,
) -> Result<ClientStats> {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut out = stream.try_clone().context("clone connection")?;
    out.write_all(&wire::encode_request(directory))
        .context("send request")?;

    let mut reader = ByteReader::new(stream);
    let stats = receive_tree(&mut reader, dest, directory, &peer, journal, logger, show_progress)?;

    out.write_all(&[wire::ACK]).context("send completion ack")?;
    Ok(stats)
}

fn receive_tree<R: Read>(
    reader: &mut ByteReader<R>,
    dest: &Path,
    directory: &str,
    peer: &str,
    journal: Option<&Journal>,
    logger: &dyn Logger,
    show_progress: bool,
) -> Result<ClientStats> {
    let started = std::time::Instant::now();
    let session_id = Uuid::new_v4();
    let count = wire::decode_file_count(reader)?;
    eprintln!("receiving {count} files");
    logger.session_start(session_id, peer, directory, count as usize);

    let bar = if show_progress {
        let b = ProgressBar::new(count as u64);
        b.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(b)
    } else {
        None
    };

    let mut stats = ClientStats::default();
    for _ in 0..count {
        let header = wire::decode_header(reader)?;
        let result = receive_file(reader, dest, &header);
        if let Some(journal) = journal {
            journal.add_entry(JournalEntry {
                timestamp: Utc::now().to_rfc3339(),
                session_id: session_id.to_string(),
                name: header.name.clone(),
                bytes: header.size as u64,
                status: if result.is_ok() {
                    EntryStatus::Completed
                } else {
                    EntryStatus::Failed
                },
            })?;
        }
        result?;

        stats.files += 1;
        stats.bytes += header.size as u64;
        logger.file_done(session_id, &header.name, header.size as u64);
        if let Some(bar) = &bar {
            bar.set_message(header.name.clone());
            bar.inc(1);
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    logger.session_done(session_id, started.elapsed().as_secs_f64());
    Ok(stats)
}

/// Receive one file body: chunk frames until the cumulative payload reaches
/// the size announced in the header. A zero-size file has no chunks, and the
/// local file is simply created empty.
fn receive_file<R: Read>(
    reader: &mut ByteReader<R>,
    dest: &Path,
    header: &wire::FileHeader,
) -> Result<()> {
    let path = local_path(dest, &header.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    // Truncating keeps re-runs of the same request idempotent.
    let mut file =
        File::create(&path).with_context(|| format!("create {}", path.display()))?;

    let mut received = 0u64;
    let mut payload = Vec::new();
    while received < header.size as u64 {
        let len = wire::decode_chunk_len(reader)?;
        payload.resize(len, 0);
        reader
            .fill(&mut payload)
            .with_context(|| format!("chunk for {}", header.name))?;
        file.write_all(&payload)
            .with_context(|| format!("write {}", path.display()))?;
        received += len as u64;
    }
    Ok(())
}

/// Where a wire name lands beneath the destination root. Wire names are
/// `/`-separated regardless of platform.
fn local_path(dest: &Path, name: &str) -> PathBuf {
    let mut path = dest.to_path_buf();
    for part in name.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

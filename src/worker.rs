//! Fixed worker pool draining the shared task queue

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::queue::Task;
use crate::server::ServerCtx;
use crate::wire;

/// Spawn the worker pool. Workers run for the life of the process; the
/// handles are returned so callers that want to park on them can.
pub fn spawn_workers(pool_size: usize, ctx: Arc<ServerCtx>) -> Vec<JoinHandle<()>> {
    (0..pool_size)
        .map(|id| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || worker_loop(id, ctx))
        })
        .collect()
}

fn worker_loop(id: usize, ctx: Arc<ServerCtx>) {
    loop {
        // Dequeue under the queue's lock, process outside it.
        let task = ctx.queue.pop();
        match process_task(&task, ctx.block_size) {
            Ok(bytes) => {
                ctx.logger.file_done(task.conn.id, &task.name, bytes);
            }
            Err(e) => {
                eprintln!(
                    "worker {id}: {} for {}: {e:#}",
                    task.name, task.conn.peer
                );
                ctx.logger.error("send", &task.path, &format!("{e:#}"));
                // Without the remaining bytes the client would wait forever;
                // cut the connection so it observes end-of-stream instead.
                task.conn.shutdown();
            }
        }
    }
}

/// Transmit one file: header, then the content as block-sized chunks, all
/// under the connection's write lock. Returns the bytes sent.
fn process_task(task: &Task, block_size: usize) -> Result<u64> {
    let mut file =
        File::open(&task.path).with_context(|| format!("open {}", task.path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("stat {}", task.path.display()))?
        .len();
    if size > u32::MAX as u64 {
        anyhow::bail!("{} exceeds the wire size limit", task.path.display());
    }

    let header = wire::encode_header(&task.name, size as u32);

    // Serializes against other workers and the coordinator writing to the
    // same connection.
    let mut out = task.conn.lock_writer();
    out.write_all(&header).context("send header")?;
    send_chunks(&mut file, &mut *out, block_size)?;
    Ok(size)
}

/// Stream `file` as chunk frames of exactly `block_size` bytes, short only
/// on the final chunk. A zero-byte read ends the loop, so an empty file
/// sends no chunks at all.
fn send_chunks<R: Read, W: Write>(file: &mut R, out: &mut W, block_size: usize) -> Result<()> {
    let mut block = vec![0u8; block_size];
    loop {
        let n = fill_block(file, &mut block)?;
        if n == 0 {
            break;
        }
        wire::write_chunk(out, &block[..n]).context("send chunk")?;
    }
    Ok(())
}

/// Read until the block is full or the file ends, retrying transient
/// interruption.
fn fill_block<R: Read>(r: &mut R, block: &mut [u8]) -> Result<usize> {
    let mut n = 0;
    while n < block.len() {
        match r.read(&mut block[n..]) {
            Ok(0) => break,
            Ok(m) => n += m,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteReader;
    use std::io::Cursor;

    fn chunk_sizes(payload: &[u8], block_size: usize) -> Vec<usize> {
        let mut wire_bytes = Vec::new();
        send_chunks(&mut Cursor::new(payload.to_vec()), &mut wire_bytes, block_size).unwrap();

        let mut r = ByteReader::new(Cursor::new(wire_bytes));
        let mut sizes = Vec::new();
        let mut received = 0usize;
        while received < payload.len() {
            let len = wire::decode_chunk_len(&mut r).unwrap();
            let mut buf = vec![0u8; len];
            r.fill(&mut buf).unwrap();
            assert_eq!(&payload[received..received + len], &buf[..]);
            received += len;
            sizes.push(len);
        }
        assert_eq!(r.next().unwrap(), None, "trailing bytes after final chunk");
        sizes
    }

    #[test]
    fn five_bytes_block_four_gives_two_chunks() {
        assert_eq!(chunk_sizes(b"hello", 4), vec![4, 1]);
    }

    #[test]
    fn exact_multiple_ends_with_a_full_block() {
        assert_eq!(chunk_sizes(&[7u8; 12], 4), vec![4, 4, 4]);
    }

    #[test]
    fn short_payload_is_a_single_short_chunk() {
        assert_eq!(chunk_sizes(b"ab", 1024), vec![2]);
    }

    #[test]
    fn empty_payload_sends_no_chunks() {
        assert_eq!(chunk_sizes(b"", 4), Vec::<usize>::new());
    }

    #[test]
    fn chunk_count_matches_ceil_division() {
        for (size, block) in [(1usize, 1usize), (10, 3), (4096, 512), (4097, 512)] {
            let payload = vec![0xA5u8; size];
            let sizes = chunk_sizes(&payload, block);
            assert_eq!(sizes.len(), size.div_ceil(block));
            for s in &sizes[..sizes.len() - 1] {
                assert_eq!(*s, block);
            }
            let tail = sizes[sizes.len() - 1];
            assert_eq!(tail, if size % block == 0 { block } else { size % block });
        }
    }

    /// Reader that returns data one byte at a time, so a block is only
    /// filled through repeated short reads.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    #[test]
    fn short_reads_still_produce_full_blocks() {
        let payload = b"abcdefgh".to_vec();
        let mut wire_bytes = Vec::new();
        send_chunks(&mut Trickle(Cursor::new(payload)), &mut wire_bytes, 4).unwrap();

        let mut r = ByteReader::new(Cursor::new(wire_bytes));
        assert_eq!(wire::decode_chunk_len(&mut r).unwrap(), 4);
        let mut buf = vec![0u8; 4];
        r.fill(&mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
        assert_eq!(wire::decode_chunk_len(&mut r).unwrap(), 4);
    }
}

//! Length-prefixed wire framing shared by client and server
//!
//! All multi-byte integers are 4-byte little-endian. The stream carries, in
//! order: one Request (client to server), one FileCount (server to client),
//! then per file a Header followed by its Chunks, and finally a one-byte
//! completion ack (client to server). Chunks have no terminator; a file ends
//! when the cumulative chunk payload reaches the size announced in its
//! header. There is no versioning and no checksum field.

use anyhow::{bail, Context, Result};
use std::io::{Read, Write};

use crate::reader::ByteReader;

// Decode-side guards against absurd length prefixes turning into huge
// allocations. Well-formed peers never come close to either limit.
pub const MAX_NAME_LEN: usize = 64 * 1024;
pub const MAX_CHUNK_LEN: usize = 64 * 1024 * 1024;

/// Byte the client sends as the completion ack. The value is ignored on
/// receipt; only its arrival matters.
pub const ACK: u8 = b' ';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub name: String,
    pub size: u32,
}

pub fn encode_request(directory: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + directory.len());
    buf.extend_from_slice(&(directory.len() as u32).to_le_bytes());
    buf.extend_from_slice(directory.as_bytes());
    buf
}

pub fn decode_request<R: Read>(r: &mut ByteReader<R>) -> Result<String> {
    let len = r.read_u32_le().context("request length")? as usize;
    if len > MAX_NAME_LEN {
        bail!("request path too long: {} bytes", len);
    }
    let mut raw = vec![0u8; len];
    r.fill(&mut raw).context("request path")?;
    String::from_utf8(raw).context("request path is not utf-8")
}

pub fn encode_file_count(count: u32) -> [u8; 4] {
    count.to_le_bytes()
}

pub fn decode_file_count<R: Read>(r: &mut ByteReader<R>) -> Result<u32> {
    r.read_u32_le().context("file count")
}

pub fn encode_header(name: &str, size: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + name.len() + 4);
    buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&size.to_le_bytes());
    buf
}

pub fn decode_header<R: Read>(r: &mut ByteReader<R>) -> Result<FileHeader> {
    let name_len = r.read_u32_le().context("file name length")? as usize;
    if name_len > MAX_NAME_LEN {
        bail!("file name too long: {} bytes", name_len);
    }
    let mut raw = vec![0u8; name_len];
    r.fill(&mut raw).context("file name")?;
    let name = String::from_utf8(raw).context("file name is not utf-8")?;
    let size = r.read_u32_le().context("file size")?;
    Ok(FileHeader { name, size })
}

/// Write one chunk frame: length prefix plus exactly `payload`.
pub fn write_chunk<W: Write>(w: &mut W, payload: &[u8]) -> Result<()> {
    w.write_all(&(payload.len() as u32).to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

pub fn decode_chunk_len<R: Read>(r: &mut ByteReader<R>) -> Result<usize> {
    let len = r.read_u32_le().context("chunk length")? as usize;
    if len > MAX_CHUNK_LEN {
        bail!("chunk too large: {} bytes", len);
    }
    Ok(len)
}

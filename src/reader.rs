//! Buffered single-pass byte source over a socket or file
//!
//! Never rewindable: once a zero-byte read marks end-of-stream, the reader
//! stays at end forever.

use anyhow::{bail, Result};
use std::io::{ErrorKind, Read};

const BUF_SIZE: usize = 4096;

pub struct ByteReader<R: Read> {
    inner: R,
    buf: [u8; BUF_SIZE],
    pos: usize,
    lim: usize,
    eof: bool,
}

impl<R: Read> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader {
            inner,
            buf: [0u8; BUF_SIZE],
            pos: 0,
            lim: 0,
            eof: false,
        }
    }

    /// Refill the internal buffer, retrying transient interruption.
    /// Returns false once the underlying reader reports end-of-stream.
    fn refill(&mut self) -> Result<bool> {
        self.lim = loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        self.pos = 0;
        if self.lim == 0 {
            self.eof = true;
            return Ok(false);
        }
        Ok(true)
    }

    /// Next byte in the stream, or None at end-of-stream.
    pub fn next(&mut self) -> Result<Option<u8>> {
        if self.eof {
            return Ok(None);
        }
        if self.pos == self.lim && !self.refill()? {
            return Ok(None);
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(Some(b))
    }

    /// Whether the end-of-stream sentinel has been returned.
    pub fn at_end(&self) -> bool {
        self.eof
    }

    /// Fill `out` completely from the stream; premature end-of-stream is an
    /// error.
    pub fn fill(&mut self, out: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < out.len() {
            if self.pos == self.lim {
                if self.eof || !self.refill()? {
                    bail!("unexpected end of stream");
                }
            }
            let take = (self.lim - self.pos).min(out.len() - done);
            out[done..done + take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            done += take;
        }
        Ok(())
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(u32::from_le_bytes(b))
    }
}

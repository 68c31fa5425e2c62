//! Buffered streaming driver.

use std::io::{ErrorKind, Read};

use riffle_poly::Pol;
use tracing::debug;

use crate::boundary::{BoundaryPolicy, RollingHash, Scan};
use crate::gear::{GearHash, SPREAD_MASKS};
use crate::rabin::RabinHash;
use crate::tables::WINDOW_SIZE;
use crate::{ChunkerError, AVERAGE_BITS, MAX_SIZE, MIN_SIZE};

/// One content-defined chunk.
///
/// `data` borrows the output buffer passed to [`Chunker::next`] and is
/// valid only until that buffer is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Absolute offset of the chunk's first byte in the stream.
    pub start: u64,
    /// Number of bytes in the chunk.
    pub length: usize,
    /// Digest value at the cut point. Informational: for a mask cut it
    /// satisfies the active mask, for a forced or end-of-input cut it is
    /// whatever the digest happened to be.
    pub cut: u64,
    /// The chunk bytes, living in the caller's output buffer.
    pub data: &'a [u8],
}

/// Size boundaries and split-mask density for a chunker.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Lower chunk size bound; only the final chunk of a stream may be
    /// shorter.
    pub min_size: usize,
    /// Upper chunk size bound, always enforced.
    pub max_size: usize,
    /// Split-mask bits; average chunk size is about `2^average_bits`.
    pub average_bits: u32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_size: MIN_SIZE,
            max_size: MAX_SIZE,
            average_bits: AVERAGE_BITS,
        }
    }
}

impl ChunkerConfig {
    /// Replaces the size boundaries.
    pub fn with_boundaries(mut self, min_size: usize, max_size: usize) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Replaces the mask density. Lower values cut more often; the
    /// default of 20 targets 1 MiB average chunks.
    pub fn with_average_bits(mut self, bits: u32) -> Self {
        self.average_bits = bits;
        self
    }

    fn validate(
        &self,
        window: usize,
        buf_len: usize,
        bits_range: std::ops::RangeInclusive<u32>,
    ) -> Result<(), ChunkerError> {
        if self.min_size > self.max_size || self.min_size < window.max(1) {
            return Err(ChunkerError::InvalidBounds {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if !bits_range.contains(&self.average_bits) {
            return Err(ChunkerError::InvalidAverageBits {
                bits: self.average_bits,
            });
        }
        if buf_len < self.min_size {
            return Err(ChunkerError::BufferTooSmall {
                len: buf_len,
                min: self.min_size,
            });
        }
        Ok(())
    }
}

/// Streaming chunker over a byte source, generic in the hash variant.
///
/// Use the [`RabinChunker`] and [`GearChunker`] aliases; their inherent
/// constructors pick the variant-appropriate masks and buffer sizes.
pub struct Chunker<R, H> {
    source: R,
    hash: H,
    policy: BoundaryPolicy,

    buf: Vec<u8>,
    bpos: usize,
    bmax: usize,

    /// Absolute offset of the current chunk's first byte.
    start: u64,
    /// Bytes consumed into the current chunk.
    count: usize,
    /// Absolute stream position.
    pos: u64,
    /// Bytes still to copy without hashing at the head of the chunk.
    pre: usize,
    closed: bool,
}

/// Chunker using the Rabin fingerprint hash.
pub type RabinChunker<R> = Chunker<R, RabinHash>;

/// Chunker using the gear hash.
pub type GearChunker<R> = Chunker<R, GearHash>;

impl<R: Read> RabinChunker<R> {
    /// Creates a chunker with the default configuration: 512 KiB
    /// minimum, 8 MiB maximum, 1 MiB average.
    pub fn new(source: R, pol: Pol) -> Result<Self, ChunkerError> {
        Self::with_config(source, pol, ChunkerConfig::default())
    }

    /// Creates a chunker with custom boundaries and mask density.
    pub fn with_config(source: R, pol: Pol, config: ChunkerConfig) -> Result<Self, ChunkerError> {
        let buf = vec![0; config.min_size.max(WINDOW_SIZE)];
        Self::with_buffer(source, pol, config, buf)
    }

    /// Creates a chunker reusing a caller-provided read buffer.
    pub fn with_buffer(
        source: R,
        pol: Pol,
        config: ChunkerConfig,
        buf: Vec<u8>,
    ) -> Result<Self, ChunkerError> {
        config.validate(WINDOW_SIZE, buf.len(), 1..=63)?;
        let hash = RabinHash::new(pol)?;
        let mask = (1u64 << config.average_bits) - 1;
        let policy = BoundaryPolicy {
            min_size: config.min_size,
            max_size: config.max_size,
            split_mask: mask,
            split_mask2: mask,
        };
        Ok(Chunker::from_parts(source, hash, policy, buf))
    }
}

impl<R: Read> GearChunker<R> {
    /// Creates a chunker with the default configuration and a fresh
    /// random table seed. Boundaries are reproducible only with
    /// [`GearChunker::with_seed`].
    pub fn new(source: R) -> Result<Self, ChunkerError> {
        Self::with_seed(source, GearHash::random_seed())
    }

    /// Creates a chunker with the default configuration and a fixed seed.
    pub fn with_seed(source: R, seed: u64) -> Result<Self, ChunkerError> {
        Self::with_config(source, seed, ChunkerConfig::default())
    }

    /// Creates a chunker with custom boundaries and mask density.
    pub fn with_config(source: R, seed: u64, config: ChunkerConfig) -> Result<Self, ChunkerError> {
        let buf = vec![0; 2 * config.min_size];
        Self::with_buffer(source, seed, config, buf)
    }

    /// Creates a chunker reusing a caller-provided read buffer.
    pub fn with_buffer(
        source: R,
        seed: u64,
        config: ChunkerConfig,
        buf: Vec<u8>,
    ) -> Result<Self, ChunkerError> {
        // the spread-mask table bounds the usable density range
        config.validate(0, buf.len(), 7..=23)?;
        let bits = config.average_bits as usize;
        let policy = BoundaryPolicy {
            min_size: config.min_size,
            max_size: config.max_size,
            // tight mask in the narrow band past the minimum, relaxed
            // beyond it: short chunks need a rare match, runaway chunks a
            // frequent one
            split_mask: SPREAD_MASKS[bits + 1],
            split_mask2: SPREAD_MASKS[bits - 1],
        };
        Ok(Chunker::from_parts(source, GearHash::new(seed), policy, buf))
    }
}

impl<R: Read, H: RollingHash> Chunker<R, H> {
    fn from_parts(source: R, hash: H, policy: BoundaryPolicy, buf: Vec<u8>) -> Self {
        debug!(
            min_size = policy.min_size,
            max_size = policy.max_size,
            buffer = buf.len(),
            "chunker ready"
        );
        let mut chunker = Self {
            source,
            hash,
            policy,
            buf,
            bpos: 0,
            bmax: 0,
            start: 0,
            count: 0,
            pos: 0,
            pre: 0,
            closed: false,
        };
        chunker.start_chunk();
        chunker
    }

    /// Resets per-chunk state after a cut (or at stream start).
    fn start_chunk(&mut self) {
        self.count = 0;
        self.start = self.pos;
        self.pre = self.hash.pre_skip(self.policy.min_size);
        self.hash.reset();
    }

    /// Begins a new logical stream from `source` at offset 0, retaining
    /// the allocated read buffer.
    pub fn reset(&mut self, source: R) {
        self.source = source;
        self.bpos = 0;
        self.bmax = 0;
        self.pos = 0;
        self.closed = false;
        self.start_chunk();
    }

    /// Consumes the chunker and returns the byte source.
    pub fn into_source(self) -> R {
        self.source
    }

    /// Produces the next chunk, appending its bytes into `out`.
    ///
    /// `out` is truncated first; on success its contents are exactly the
    /// chunk bytes. Returns `Ok(None)` once the stream is exhausted. A
    /// source error aborts the in-progress chunk; the chunker must be
    /// [`reset`](Chunker::reset) before it can be trusted again.
    pub fn next<'a>(&mut self, out: &'a mut Vec<u8>) -> Result<Option<Chunk<'a>>, ChunkerError> {
        out.clear();
        match self.advance_chunk(out)? {
            Some((start, length, cut)) => Ok(Some(Chunk {
                start,
                length,
                cut,
                data: out.as_slice(),
            })),
            None => Ok(None),
        }
    }

    fn advance_chunk(
        &mut self,
        out: &mut Vec<u8>,
    ) -> Result<Option<(u64, usize, u64)>, ChunkerError> {
        loop {
            if self.bpos >= self.bmax {
                if self.refill()? == 0 {
                    // clean end of input: flush the accumulated chunk
                    // once, then report exhaustion
                    if !self.closed {
                        self.closed = true;
                        if self.count > 0 {
                            return Ok(Some((self.start, self.count, self.hash.digest())));
                        }
                    }
                    return Ok(None);
                }
            }

            // serve the pre-skip: copy without hashing
            if self.pre > 0 {
                let take = self.pre.min(self.bmax - self.bpos);
                out.extend_from_slice(&self.buf[self.bpos..self.bpos + take]);
                self.bpos += take;
                self.count += take;
                self.pos += take as u64;
                self.pre -= take;
                if self.bpos >= self.bmax {
                    continue;
                }
            }

            match self
                .policy
                .scan(&mut self.hash, &self.buf[self.bpos..self.bmax], self.count)
            {
                Scan::Split { end, cut } => {
                    out.extend_from_slice(&self.buf[self.bpos..self.bpos + end]);
                    self.bpos += end;
                    self.count += end;
                    self.pos += end as u64;
                    let emitted = (self.start, self.count, cut);
                    self.start_chunk();
                    return Ok(Some(emitted));
                }
                Scan::NoSplit => {
                    let n = self.bmax - self.bpos;
                    out.extend_from_slice(&self.buf[self.bpos..self.bmax]);
                    self.bpos = self.bmax;
                    self.count += n;
                    self.pos += n as u64;
                }
            }
        }
    }

    /// Refills the read buffer, reassembling partial reads. Returns the
    /// number of bytes buffered; 0 only at end of input.
    fn refill(&mut self) -> Result<usize, ChunkerError> {
        let mut n = 0;
        while n < self.buf.len() {
            match self.source.read(&mut self.buf[n..]) {
                Ok(0) => break,
                Ok(m) => n += m,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChunkerError::Source(e)),
            }
        }
        self.bpos = 0;
        self.bmax = n;
        Ok(n)
    }
}

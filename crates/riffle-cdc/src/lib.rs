//! Streaming content-defined chunking.
//!
//! Partitions a byte stream into variable-length chunks whose boundaries
//! depend on the content of a rolling window rather than on absolute
//! offsets. Local edits therefore shift only the chunks that overlap the
//! edit, which is what makes downstream deduplication work.
//!
//! Two rolling-hash variants are provided behind one driver:
//!
//! - [`RabinChunker`]: a Rabin fingerprint over GF(2)[X] with a 64-byte
//!   sliding window and polynomial-derived lookup tables. Fully
//!   deterministic for a fixed polynomial.
//! - [`GearChunker`]: a gear hash driven by a seeded 256-entry byte
//!   table. No explicit window, faster, deterministic once the seed is
//!   fixed.
//!
//! # Example
//!
//! ```no_run
//! use riffle_cdc::RabinChunker;
//! use riffle_poly::DEFAULT_POLYNOMIAL;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = std::fs::File::open("large.bin")?;
//! let mut chunker = RabinChunker::new(file, DEFAULT_POLYNOMIAL)?;
//!
//! // reuse one output buffer across calls
//! let mut buf = Vec::with_capacity(8 * 1024 * 1024);
//! while let Some(chunk) = chunker.next(&mut buf)? {
//!     println!("{} {}", chunk.start, chunk.length);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod boundary;
mod chunker;
mod gear;
mod rabin;
mod tables;

pub use boundary::RollingHash;
pub use chunker::{Chunk, Chunker, ChunkerConfig, GearChunker, RabinChunker};
pub use gear::{GearHash, SPREAD_MASKS};
pub use rabin::RabinHash;
pub use tables::WINDOW_SIZE;

use thiserror::Error;

/// Default minimal chunk size (512 KiB).
pub const MIN_SIZE: usize = 512 * 1024;

/// Default maximal chunk size (8 MiB).
pub const MAX_SIZE: usize = 8 * 1024 * 1024;

/// Default number of split-mask bits, targeting 1 MiB average chunks.
pub const AVERAGE_BITS: u32 = 20;

/// Errors from chunker construction and streaming.
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// The byte source failed; the in-progress chunk is lost and the
    /// chunker should be reset before further use.
    #[error("source read failed: {0}")]
    Source(#[from] std::io::Error),

    /// The chunking polynomial has an unusable degree
    #[error("polynomial degree {degree} is outside (8, 53]")]
    InvalidPolynomial {
        /// Degree of the rejected polynomial
        degree: i64,
    },

    /// Size boundaries are inverted or below the hash window
    #[error("invalid chunk bounds: min {min}, max {max}")]
    InvalidBounds {
        /// Requested minimum chunk size
        min: usize,
        /// Requested maximum chunk size
        max: usize,
    },

    /// The requested average is outside the variant's mask range
    #[error("average bits {bits} out of range for this hash variant")]
    InvalidAverageBits {
        /// Requested split-mask bits
        bits: u32,
    },

    /// A caller-provided read buffer is smaller than the refill quantum
    #[error("read buffer of {len} bytes is below the minimum chunk size {min}")]
    BufferTooSmall {
        /// Provided buffer length
        len: usize,
        /// Minimum chunk size it must hold
        min: usize,
    },
}

//! Rabin fingerprint rolling hash.

use std::sync::Arc;

use riffle_poly::Pol;

use crate::boundary::RollingHash;
use crate::tables::{tables_for, RollingTables, WINDOW_SIZE};
use crate::ChunkerError;

/// Rolling Rabin fingerprint over a 64-byte sliding window.
///
/// The digest is the residue, modulo the chunking polynomial, of the
/// polynomial whose coefficients are the window bytes. Each input byte
/// costs two table lookups: one to cancel the byte leaving the window,
/// one to fold the top byte of the shifted digest.
pub struct RabinHash {
    tables: Arc<RollingTables>,
    /// `deg(P) − 8`: shift distance that exposes the top byte for the
    /// mod-reduction lookup.
    poly_shift: u32,
    window: [u8; WINDOW_SIZE],
    wpos: usize,
    digest: u64,
}

impl RabinHash {
    /// Creates the hash for `pol`, fetching (or building) its tables.
    ///
    /// The degree must lie in `(8, 53]` so that one byte fits above the
    /// residue and all shift distances stay within the value width.
    pub fn new(pol: Pol) -> Result<Self, ChunkerError> {
        let degree = pol.deg();
        if !(9..=53).contains(&degree) {
            return Err(ChunkerError::InvalidPolynomial { degree });
        }

        let mut hash = Self {
            tables: tables_for(pol),
            poly_shift: (degree - 8) as u32,
            window: [0; WINDOW_SIZE],
            wpos: 0,
            digest: 0,
        };
        hash.reset();
        Ok(hash)
    }

    #[inline]
    fn slide(&mut self, b: u8) {
        let out = self.window[self.wpos];
        self.window[self.wpos] = b;
        self.digest ^= self.tables.slide_out[out as usize];
        self.wpos = (self.wpos + 1) % WINDOW_SIZE;

        let index = (self.digest >> self.poly_shift) as usize;
        self.digest = ((self.digest << 8) | b as u64) ^ self.tables.mod_reduce[index];
    }
}

impl RollingHash for RabinHash {
    fn reset(&mut self) {
        self.window = [0; WINDOW_SIZE];
        self.wpos = 0;
        self.digest = 0;
        // historical priming: one slide of byte 1 over the zeroed window,
        // preserved for boundary compatibility across implementations
        self.slide(1);
    }

    #[inline]
    fn advance(&mut self, byte: u8) -> u64 {
        self.slide(byte);
        self.digest
    }

    fn digest(&self) -> u64 {
        self.digest
    }

    fn pre_skip(&self, min_size: usize) -> usize {
        // the window must be refilled with real bytes before boundary
        // tests resume, so hashing restarts a window short of the minimum
        min_size.saturating_sub(WINDOW_SIZE)
    }
}

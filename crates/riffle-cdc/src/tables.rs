//! Per-polynomial lookup tables for the Rabin rolling hash.
//!
//! Building the tables costs 256 × window-size modular reductions, so
//! they are memoized process-wide; chunkers snapshot an `Arc` at
//! construction and never touch the lock again while streaming.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use riffle_poly::Pol;
use tracing::debug;

/// Sliding-window width of the Rabin hash, in bytes.
pub const WINDOW_SIZE: usize = 64;

/// Lookup tables uniquely determined by a chunking polynomial.
#[derive(Debug)]
pub(crate) struct RollingTables {
    /// `slide_out[b] = hash(b ‖ 0^{w−1})`: XORing this cancels the
    /// contribution of byte `b` leaving the window.
    pub(crate) slide_out: [u64; 256],
    /// `mod_reduce[b] = ((b·x^k) mod P) | (b·x^k)` with `k = deg(P)`:
    /// one XOR folds the top byte of the digest and cancels it.
    pub(crate) mod_reduce: [u64; 256],
}

static TABLE_CACHE: LazyLock<Mutex<HashMap<Pol, Arc<RollingTables>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the tables for `pol`, building them on first use.
pub(crate) fn tables_for(pol: Pol) -> Arc<RollingTables> {
    let mut cache = TABLE_CACHE.lock();
    cache
        .entry(pol)
        .or_insert_with(|| Arc::new(RollingTables::build(pol)))
        .clone()
}

impl RollingTables {
    fn build(pol: Pol) -> Self {
        debug!(polynomial = %pol, "building rolling tables");

        let mut slide_out = [0u64; 256];
        for b in 0..256u64 {
            let mut h = append_byte(Pol::ZERO, b as u8, pol);
            for _ in 0..WINDOW_SIZE - 1 {
                h = append_byte(h, 0, pol);
            }
            slide_out[b as usize] = h.bits();
        }

        let k = pol.deg() as u32;
        let mut mod_reduce = [0u64; 256];
        for b in 0..256u64 {
            mod_reduce[b as usize] = Pol::new(b << k).modulo(pol).bits() | (b << k);
        }

        Self {
            slide_out,
            mod_reduce,
        }
    }
}

/// Extends the hashed message by one byte: `h·x^8 + b mod pol`.
fn append_byte(h: Pol, b: u8, pol: Pol) -> Pol {
    Pol::new((h.bits() << 8) | b as u64).modulo(pol)
}

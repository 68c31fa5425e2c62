//! Polynomial arithmetic over GF(2)[X].
//!
//! Provides the [`Pol`] value type: a 64-bit coefficient vector with
//! carry-less arithmetic, Euclidean division, an irreducibility test and
//! derivation of fresh chunking polynomials from an entropy source.
//!
//! Rabin fingerprinting treats a byte window as a polynomial over GF(2)
//! and fingerprints it as the residue modulo a fixed irreducible
//! polynomial; everything the chunking layer needs from that algebra
//! lives here.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod pol;

pub use pol::{Pol, CHUNKING_DEGREE, DEFAULT_POLYNOMIAL};

use thiserror::Error;

/// Errors from polynomial parsing and derivation.
#[derive(Debug, Error)]
pub enum PolError {
    /// Malformed textual polynomial representation
    #[error("invalid polynomial string: {0:?}")]
    Parse(String),

    /// The entropy source failed mid-derivation
    #[error("entropy source failed: {0}")]
    Entropy(#[from] std::io::Error),

    /// No irreducible polynomial found within the candidate budget
    #[error("no irreducible polynomial found in {0} candidates")]
    NoIrreducible(usize),
}

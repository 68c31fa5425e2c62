//! Shared helpers for the riffle end-to-end suites.
//!
//! Deterministic data generation and misbehaving readers; the suites
//! themselves live under `tests/`.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod data;
pub mod readers;

pub use data::deterministic_bytes;
pub use readers::{FailAfter, ShortReads};

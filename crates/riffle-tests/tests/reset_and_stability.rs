//! Reset semantics and content-defined stability under edits.

use std::io::Cursor;

use riffle_cdc::{Chunk, ChunkerConfig, GearChunker, RabinChunker};
use riffle_poly::DEFAULT_POLYNOMIAL;
use riffle_tests::deterministic_bytes;

const GEAR_SEED: u64 = 0xc0ff_ee00_c0ff_ee00;

fn config() -> ChunkerConfig {
    ChunkerConfig::default()
        .with_boundaries(4096, 65536)
        .with_average_bits(12)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rec {
    start: u64,
    length: usize,
    cut: u64,
}

impl From<Chunk<'_>> for Rec {
    fn from(c: Chunk<'_>) -> Self {
        Rec {
            start: c.start,
            length: c.length,
            cut: c.cut,
        }
    }
}

fn drain<R, H>(chunker: &mut riffle_cdc::Chunker<R, H>) -> Vec<Rec>
where
    R: std::io::Read,
    H: riffle_cdc::RollingHash,
{
    let mut out = Vec::new();
    let mut recs = Vec::new();
    while let Some(chunk) = chunker.next(&mut out).unwrap() {
        recs.push(Rec::from(chunk));
    }
    recs
}

#[test]
fn reset_mid_stream_matches_a_fresh_chunker() {
    let data = deterministic_bytes(20, 512 * 1024);
    let decoy = deterministic_bytes(21, 256 * 1024);

    let mut fresh =
        RabinChunker::with_config(Cursor::new(&data), DEFAULT_POLYNOMIAL, config()).unwrap();
    let expected = drain(&mut fresh);

    // chunk part of an unrelated stream, then reset onto the real one
    let mut reused =
        RabinChunker::with_config(Cursor::new(&decoy), DEFAULT_POLYNOMIAL, config()).unwrap();
    let mut out = Vec::new();
    reused.next(&mut out).unwrap().expect("mid-stream chunk");
    reused.reset(Cursor::new(&data));

    assert_eq!(drain(&mut reused), expected);
}

#[test]
fn gear_reset_mid_stream_matches_a_fresh_chunker() {
    let data = deterministic_bytes(22, 512 * 1024);
    let decoy = deterministic_bytes(23, 256 * 1024);

    let mut fresh = GearChunker::with_config(Cursor::new(&data), GEAR_SEED, config()).unwrap();
    let expected = drain(&mut fresh);

    let mut reused = GearChunker::with_config(Cursor::new(&decoy), GEAR_SEED, config()).unwrap();
    let mut out = Vec::new();
    reused.next(&mut out).unwrap().expect("mid-stream chunk");
    reused.reset(Cursor::new(&data));

    assert_eq!(drain(&mut reused), expected);
}

#[test]
fn appending_data_preserves_all_settled_chunks() {
    // chunk boundaries depend only on the bytes before them, so every
    // chunk except the unfinished final one must survive an append
    let data = deterministic_bytes(24, 512 * 1024);
    let mut extended = data.clone();
    extended.extend_from_slice(&deterministic_bytes(25, 64 * 1024));

    let mut base =
        RabinChunker::with_config(Cursor::new(&data), DEFAULT_POLYNOMIAL, config()).unwrap();
    let mut grown =
        RabinChunker::with_config(Cursor::new(&extended), DEFAULT_POLYNOMIAL, config()).unwrap();

    let base_recs = drain(&mut base);
    let grown_recs = drain(&mut grown);

    assert!(base_recs.len() > 3);
    let settled = base_recs.len() - 1;
    assert_eq!(grown_recs[..settled], base_recs[..settled]);
}

#[test]
fn gear_appending_data_preserves_all_settled_chunks() {
    let data = deterministic_bytes(26, 512 * 1024);
    let mut extended = data.clone();
    extended.extend_from_slice(&deterministic_bytes(27, 64 * 1024));

    let mut base = GearChunker::with_config(Cursor::new(&data), GEAR_SEED, config()).unwrap();
    let mut grown =
        GearChunker::with_config(Cursor::new(&extended), GEAR_SEED, config()).unwrap();

    let base_recs = drain(&mut base);
    let grown_recs = drain(&mut grown);

    assert!(base_recs.len() > 3);
    let settled = base_recs.len() - 1;
    assert_eq!(grown_recs[..settled], base_recs[..settled]);
}

#[test]
fn prepending_data_realigns_after_the_edit() {
    // boundaries are content-defined, so after the disturbed region the
    // cut positions should drift back into agreement; compare the chunk
    // length sequences from the rear
    let data = deterministic_bytes(28, 1024 * 1024);
    let mut shifted = deterministic_bytes(29, 1000);
    shifted.extend_from_slice(&data);

    let mut base =
        RabinChunker::with_config(Cursor::new(&data), DEFAULT_POLYNOMIAL, config()).unwrap();
    let mut moved =
        RabinChunker::with_config(Cursor::new(&shifted), DEFAULT_POLYNOMIAL, config()).unwrap();

    let base_lens: Vec<usize> = drain(&mut base).iter().map(|r| r.length).collect();
    let moved_lens: Vec<usize> = drain(&mut moved).iter().map(|r| r.length).collect();

    let shared = base_lens
        .iter()
        .rev()
        .zip(moved_lens.iter().rev())
        .skip(1) // the final chunks absorb the length difference
        .take_while(|(a, b)| a == b)
        .count();
    assert!(
        shared > 0,
        "no chunk survived a 1000-byte prepend: {base_lens:?} vs {moved_lens:?}"
    );
}

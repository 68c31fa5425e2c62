//! Edge cases of the streaming driver: empty and tiny inputs, exact
//! size-bound hits, and source failures.

use std::io::Cursor;

use riffle_cdc::{ChunkerConfig, ChunkerError, GearChunker, RabinChunker};
use riffle_poly::DEFAULT_POLYNOMIAL;
use riffle_tests::{deterministic_bytes, FailAfter};

const GEAR_SEED: u64 = 0xfeed_beef_0123_4567;

#[test]
fn empty_input_is_immediately_exhausted() {
    let mut out = Vec::new();

    let mut rabin = RabinChunker::new(Cursor::new(Vec::new()), DEFAULT_POLYNOMIAL).unwrap();
    assert!(rabin.next(&mut out).unwrap().is_none());
    assert!(rabin.next(&mut out).unwrap().is_none());

    let mut gear = GearChunker::with_seed(Cursor::new(Vec::new()), GEAR_SEED).unwrap();
    assert!(gear.next(&mut out).unwrap().is_none());
}

#[test]
fn one_byte_input_yields_one_final_chunk() {
    let mut out = Vec::new();

    let mut rabin = RabinChunker::new(Cursor::new(vec![0x42]), DEFAULT_POLYNOMIAL).unwrap();
    let chunk = rabin.next(&mut out).unwrap().expect("one chunk");
    assert_eq!((chunk.start, chunk.length), (0, 1));
    assert_eq!(chunk.data, &[0x42]);
    assert!(rabin.next(&mut out).unwrap().is_none());

    let mut gear = GearChunker::with_seed(Cursor::new(vec![0x42]), GEAR_SEED).unwrap();
    let chunk = gear.next(&mut out).unwrap().expect("one chunk");
    assert_eq!((chunk.start, chunk.length), (0, 1));
    assert!(gear.next(&mut out).unwrap().is_none());
}

#[test]
fn tail_shorter_than_min_is_allowed_only_at_the_end() {
    let config = ChunkerConfig::default()
        .with_boundaries(4096, 65536)
        .with_average_bits(12);
    let data = deterministic_bytes(40, 1000); // below min_size
    let mut chunker =
        RabinChunker::with_config(Cursor::new(&data), DEFAULT_POLYNOMIAL, config).unwrap();

    let mut out = Vec::new();
    let chunk = chunker.next(&mut out).unwrap().expect("final short chunk");
    assert_eq!(chunk.length, 1000);
    assert_eq!(chunk.data, &data[..]);
    assert!(chunker.next(&mut out).unwrap().is_none());
}

/// With `min == max` every boundary is a forced cut, making exact
/// size-bound behavior observable without betting on digest values.
fn pinned(size: usize) -> ChunkerConfig {
    ChunkerConfig::default()
        .with_boundaries(size, size)
        .with_average_bits(12)
}

#[test]
fn input_of_exactly_max_is_one_chunk() {
    let size = 4096;
    let data = deterministic_bytes(41, size);
    let mut out = Vec::new();

    let mut rabin =
        RabinChunker::with_config(Cursor::new(&data), DEFAULT_POLYNOMIAL, pinned(size)).unwrap();
    let chunk = rabin.next(&mut out).unwrap().expect("one chunk");
    assert_eq!((chunk.start, chunk.length), (0, size));
    assert!(rabin.next(&mut out).unwrap().is_none());

    let mut gear =
        GearChunker::with_config(Cursor::new(&data), GEAR_SEED, pinned(size)).unwrap();
    let chunk = gear.next(&mut out).unwrap().expect("one chunk");
    assert_eq!((chunk.start, chunk.length), (0, size));
    assert!(gear.next(&mut out).unwrap().is_none());
}

#[test]
fn input_of_max_plus_one_splits_into_max_and_one() {
    let size = 4096;
    let data = deterministic_bytes(42, size + 1);
    let mut out = Vec::new();

    for variant in ["rabin", "gear"] {
        let chunks: Vec<(u64, usize)> = match variant {
            "rabin" => {
                let mut c = RabinChunker::with_config(
                    Cursor::new(&data),
                    DEFAULT_POLYNOMIAL,
                    pinned(size),
                )
                .unwrap();
                let mut v = Vec::new();
                while let Some(chunk) = c.next(&mut out).unwrap() {
                    v.push((chunk.start, chunk.length));
                }
                v
            }
            _ => {
                let mut c =
                    GearChunker::with_config(Cursor::new(&data), GEAR_SEED, pinned(size)).unwrap();
                let mut v = Vec::new();
                while let Some(chunk) = c.next(&mut out).unwrap() {
                    v.push((chunk.start, chunk.length));
                }
                v
            }
        };
        assert_eq!(
            chunks,
            vec![(0, size), (size as u64, 1)],
            "{variant} split sequence"
        );
    }
}

#[test]
fn source_errors_surface_to_the_caller() {
    let config = ChunkerConfig::default()
        .with_boundaries(4096, 65536)
        .with_average_bits(12);
    let data = deterministic_bytes(43, 256 * 1024);
    let source = FailAfter::new(Cursor::new(data), 10_000);
    let mut chunker = RabinChunker::with_config(source, DEFAULT_POLYNOMIAL, config).unwrap();

    let mut out = Vec::new();
    let err = loop {
        match chunker.next(&mut out) {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("stream must fail before exhaustion"),
            Err(e) => break e,
        }
    };
    match err {
        ChunkerError::Source(e) => assert_eq!(e.kind(), std::io::ErrorKind::Other),
        other => panic!("expected a source error, got {other}"),
    }
}

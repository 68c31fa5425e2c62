//! riffle CLI - content-defined chunking from the command line.
//!
//! Streams files through the Rabin or gear chunker, printing one line
//! per chunk, and offers small helpers around chunking polynomials.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use riffle_cdc::{ChunkerConfig, GearChunker, RabinChunker};
use riffle_poly::{Pol, DEFAULT_POLYNOMIAL};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Content-defined chunking CLI.
#[derive(Parser)]
#[command(name = "riffle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into content-defined chunks
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Chunking polynomial as hex (Rabin variant)
        #[arg(long)]
        pol: Option<String>,

        /// Use the gear hash instead of the Rabin fingerprint
        #[arg(long)]
        gear: bool,

        /// Gear table seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Minimum chunk size in bytes
        #[arg(long)]
        min: Option<usize>,

        /// Maximum chunk size in bytes
        #[arg(long)]
        max: Option<usize>,

        /// Split-mask bits; average chunk size is about 2^bits
        #[arg(long)]
        average_bits: Option<u32>,
    },

    /// Derive a fresh random chunking polynomial
    Derive,

    /// Inspect a polynomial: degree, irreducibility, written-out form
    Check {
        /// Polynomial as hex
        pol: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Chunk {
            file,
            pol,
            gear,
            seed,
            min,
            max,
            average_bits,
        } => chunk_file(file, pol, gear, seed, min, max, average_bits),
        Commands::Derive => {
            let pol = Pol::random()?;
            println!("{pol:x}");
            Ok(())
        }
        Commands::Check { pol } => check_polynomial(&pol),
    }
}

fn build_config(
    min: Option<usize>,
    max: Option<usize>,
    average_bits: Option<u32>,
) -> ChunkerConfig {
    let mut config = ChunkerConfig::default();
    if let (Some(min), Some(max)) = (min, max) {
        config = config.with_boundaries(min, max);
    } else if let Some(min) = min {
        config = config.with_boundaries(min, config.max_size);
    } else if let Some(max) = max {
        config = config.with_boundaries(config.min_size, max);
    }
    if let Some(bits) = average_bits {
        config = config.with_average_bits(bits);
    }
    config
}

fn chunk_file(
    file: PathBuf,
    pol: Option<String>,
    gear: bool,
    seed: Option<u64>,
    min: Option<usize>,
    max: Option<usize>,
    average_bits: Option<u32>,
) -> Result<()> {
    let config = build_config(min, max, average_bits);
    let reader = BufReader::new(
        File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?,
    );

    let mut out = Vec::with_capacity(config.max_size);
    let mut count = 0u64;
    let mut total = 0u64;

    if gear {
        if pol.is_some() {
            bail!("--pol selects the Rabin variant and cannot be combined with --gear");
        }
        let mut chunker = match seed {
            Some(seed) => GearChunker::with_config(reader, seed, config)?,
            None => {
                let seed = riffle_cdc::GearHash::random_seed();
                debug!(seed, "using random gear seed");
                GearChunker::with_config(reader, seed, config)?
            }
        };
        while let Some(chunk) = chunker.next(&mut out)? {
            println!(
                "{} {} {:016x} {}",
                chunk.start,
                chunk.length,
                chunk.cut,
                blake3::hash(chunk.data).to_hex()
            );
            count += 1;
            total += chunk.length as u64;
        }
    } else {
        let pol = match pol {
            Some(s) => s.parse::<Pol>()?,
            None => DEFAULT_POLYNOMIAL,
        };
        debug!(polynomial = %pol, "chunking with the Rabin fingerprint");
        let mut chunker = RabinChunker::with_config(reader, pol, config)?;
        while let Some(chunk) = chunker.next(&mut out)? {
            println!(
                "{} {} {:016x} {}",
                chunk.start,
                chunk.length,
                chunk.cut,
                blake3::hash(chunk.data).to_hex()
            );
            count += 1;
            total += chunk.length as u64;
        }
    }

    if count > 0 {
        eprintln!("{count} chunks, {total} bytes, mean {} bytes", total / count);
    } else {
        eprintln!("empty input");
    }
    Ok(())
}

fn check_polynomial(s: &str) -> Result<()> {
    let pol: Pol = s.parse()?;
    println!("polynomial:  {pol}");
    println!("degree:      {}", pol.deg());
    println!("irreducible: {}", pol.irreducible());
    println!("expanded:    {}", pol.expand());
    Ok(())
}

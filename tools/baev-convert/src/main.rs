//! baev-convert - BAEV animation event archive converter
//!
//! Decodes `.baev` archives to JSON, encodes JSON back to `.baev`, and checks
//! that archives survive a decode / re-encode / re-decode round trip.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nether_baev::{Archive, DecodeOptions};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "baev-convert")]
#[command(about = "BAEV animation event archive converter")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode .baev archives to JSON
    Decode {
        /// Input .baev files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Warn instead of failing on unexpected magic tags and element sizes
        #[arg(long)]
        lenient: bool,
    },

    /// Encode JSON trees to .baev archives
    Encode {
        /// Input .json files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that archives survive a decode and re-encode
    Verify {
        /// Input .baev files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Warn instead of failing on unexpected magic tags and element sizes
        #[arg(long)]
        lenient: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Decode {
            inputs,
            output,
            lenient,
        } => {
            let options = decode_options(lenient);
            run_all(&inputs, |input| {
                decode_file(input, output.as_deref(), &options)
            })?;
        }

        Commands::Encode { inputs, output } => {
            run_all(&inputs, |input| encode_file(input, output.as_deref()))?;
        }

        Commands::Verify { inputs, lenient } => {
            let options = decode_options(lenient);
            run_all(&inputs, |input| verify_file(input, &options))?;
        }
    }

    Ok(())
}

fn decode_options(lenient: bool) -> DecodeOptions {
    if lenient {
        DecodeOptions::lenient()
    } else {
        DecodeOptions::default()
    }
}

/// Process every input in parallel, reporting each failure.
///
/// Files are independent, so one failure does not stop the others.
fn run_all(inputs: &[PathBuf], process: impl Fn(&Path) -> Result<()> + Sync) -> Result<()> {
    let failed = inputs
        .par_iter()
        .filter(|input| match process(input) {
            Ok(()) => false,
            Err(e) => {
                tracing::error!("{}: {:#}", input.display(), e);
                true
            }
        })
        .count();

    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, inputs.len());
    }
    Ok(())
}

fn decode_file(input: &Path, out_dir: Option<&Path>, options: &DecodeOptions) -> Result<()> {
    let archive = read_archive(input, options)?;
    let json = nether_baev::to_json_string(&archive)
        .with_context(|| format!("Failed to project {:?} to JSON", input))?;

    let output = output_path(input, out_dir, "json");
    write_atomic(&output, json.as_bytes())?;
    tracing::info!("Decoded {:?} -> {:?}", input, output);
    Ok(())
}

fn encode_file(input: &Path, out_dir: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {:?}", input))?;
    let archive = nether_baev::from_json_str(&text)
        .with_context(|| format!("Failed to parse JSON tree {:?}", input))?;
    let bytes = nether_baev::encode(&archive)
        .with_context(|| format!("Failed to encode {:?}", input))?;

    let output = output_path(input, out_dir, "baev");
    write_atomic(&output, &bytes)?;
    tracing::info!(
        "Encoded {:?} -> {:?} ({} bytes)",
        input,
        output,
        bytes.len()
    );
    Ok(())
}

fn verify_file(input: &Path, options: &DecodeOptions) -> Result<()> {
    let archive = read_archive(input, options)?;
    let bytes = nether_baev::encode(&archive)
        .with_context(|| format!("Failed to re-encode {:?}", input))?;
    let decoded = nether_baev::decode(&bytes)
        .with_context(|| format!("Failed to decode re-encoded {:?}", input))?;

    if decoded.container != archive.container {
        anyhow::bail!("Re-encoded container differs from the original");
    }
    if decoded.header.annotation != archive.header.annotation {
        anyhow::bail!("Re-encoded annotation differs from the original");
    }

    tracing::info!(
        "Verified {:?}: {} buckets, {} nodes, {} events ({} -> {} bytes)",
        input,
        archive.container.event_info.len(),
        archive.container.nodes.len(),
        archive.container.event_count(),
        archive.header.file_size,
        bytes.len()
    );
    Ok(())
}

fn read_archive(input: &Path, options: &DecodeOptions) -> Result<Archive> {
    let data = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
    nether_baev::decode_with(&data, options)
        .with_context(|| format!("Failed to decode {:?}", input))
}

/// `<out_dir or input dir>/<input stem>.<ext>`
fn output_path(input: &Path, out_dir: Option<&Path>, ext: &str) -> PathBuf {
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    // Keep inner dots: `Player.root.baev` -> `Player.root.json`
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(ext);
    dir.join(name)
}

/// Write to a temporary sibling, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write {:?}", path))?;
    file.persist(path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

//! Reference command line collaborator for the oblivious sort engine.
//!
//! Reads a JSON array of `{sort_key, payload}` records, runs the engine
//! against an in-memory untrusted store with the AES-CTR envelope, and
//! emits a JSON array of the same shape, ascending by `sort_key`.

pub mod json_io;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use obsort_core::rng::session_rng;
use obsort_core::{
    AesCtrEnvelope, MemoryStore, MergeSplitStrategy, ObliviousSorter, SortConfig, SortError,
};

/// Process exit codes, stable for scripting.
pub const EXIT_OK: u8 = 0;
pub const EXIT_IO: u8 = 1;
pub const EXIT_PARSE: u8 = 2;
pub const EXIT_OVERFLOW: u8 = 3;
pub const EXIT_OTHER: u8 = 4;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Sort(#[from] SortError),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io(_) => EXIT_IO,
            Self::Parse(_) => EXIT_PARSE,
            Self::Sort(SortError::BucketOverflow { .. }) => EXIT_OVERFLOW,
            Self::Sort(_) => EXIT_OTHER,
        }
    }
}

/// Everything the `sort` subcommand needs.
#[derive(Debug, Clone)]
pub struct SortRequest {
    pub input: PathBuf,
    pub bucket_capacity: usize,
    pub strategy: MergeSplitStrategy,
    /// Write here instead of stdout when set.
    pub output: Option<PathBuf>,
}

/// Run one sort end to end. Returns the rendered JSON when no output path
/// was given, so the caller can print it.
pub fn run_sort(request: &SortRequest) -> Result<Option<String>, CliError> {
    let text = fs::read_to_string(&request.input)?;
    let items = json_io::parse_items(&text)?;
    debug!(
        "loaded {} records from {}",
        items.len(),
        request.input.display()
    );

    let store = MemoryStore::new();
    let mut rng = session_rng();
    let envelope = AesCtrEnvelope::new(&mut rng);
    let config = SortConfig {
        bucket_capacity: request.bucket_capacity,
        safety_factor: 1,
        strategy: request.strategy,
    };
    let mut sorter = ObliviousSorter::with_rng(&store, envelope, config, rng);
    let sorted = sorter.sort(&items)?;

    let rendered = json_io::render_items(sorted)?;
    match &request.output {
        Some(path) => {
            write_output(path, &rendered)?;
            Ok(None)
        }
        None => Ok(Some(rendered)),
    }
}

fn write_output(path: &Path, rendered: &str) -> Result<(), CliError> {
    fs::write(path, rendered)?;
    debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_error_kinds() {
        let io: CliError = std::io::Error::other("gone").into();
        assert_eq!(io.exit_code(), EXIT_IO);

        let parse: CliError = serde_json::from_str::<Vec<i32>>("[").unwrap_err().into();
        assert_eq!(parse.exit_code(), EXIT_PARSE);

        let overflow: CliError = SortError::BucketOverflow {
            level: 0,
            pair_index: 0,
            side: obsort_core::OverflowSide::Output0,
        }
        .into();
        assert_eq!(overflow.exit_code(), EXIT_OVERFLOW);

        let param: CliError = SortError::Parameter {
            reason: "bad".into(),
        }
        .into();
        assert_eq!(param.exit_code(), EXIT_OTHER);
    }
}

//! Error types for gtf-txinfo.
//!
//! Errors on individual records are usually handled where they are raised
//! (see [`MalformedPolicy`](crate::options::MalformedPolicy)); the variants
//! here are what escapes when the chosen policy says so, plus the fatal
//! file-level errors.

use std::path::PathBuf;
use thiserror::Error;

/// The example invocation shown whenever we cannot figure out which file to parse.
pub(crate) const EXAMPLE_USAGE: &str =
    "gtf-txinfo --gtf-file Homo_sapiens.GRCh38.96.gtf --output-prefix HG38.96 -c";

#[derive(Debug, Error)]
pub enum TxInfoError {
    /// No input file was given and the working directory did not contain exactly one GTF file.
    #[error("{}", discovery_message(.dir, .candidates))]
    InputDiscovery {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// An attribute token had no `key "value"` shape.
    #[error("line {line}: cannot parse attribute token {token:?}, expected key \"value\"")]
    MalformedAttribute { line: usize, token: String },

    /// A record line did not have the nine tab-separated GTF columns.
    #[error("line {line}: found {found} tab-separated columns, expected 9")]
    MalformedRecord { line: usize, found: usize },

    /// Start or stop was not an integer.
    #[error("line {line}: the {field} column {value:?} is not a valid integer")]
    TypeCoercion {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Start was below 1, or stop came before start.
    #[error("line {line}: invalid interval (start {start}, stop {stop}); GTF coordinates need 1 <= start <= stop")]
    InvalidInterval { line: usize, start: i64, stop: i64 },

    /// Exons that reference a transcript_id with no transcript record.
    #[error("{count} exon records reference a transcript_id without a transcript record (first: {first:?})")]
    OrphanExons { count: usize, first: Option<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TxInfoError {
    /// Returns `true` for the error that maps to the "nothing to do" exit status of the binary.
    pub fn is_input_discovery(&self) -> bool {
        matches!(self, TxInfoError::InputDiscovery { .. })
    }
}

fn discovery_message(dir: &std::path::Path, candidates: &[PathBuf]) -> String {
    let mut msg = String::from(
        "This program parses out information about each transcript from an input GTF file.\n",
    );
    if candidates.is_empty() {
        msg.push_str(&format!(
            "No GTF files are present in {}.\n\
             Please use the --gtf-file option to specify the path to the GTF file you wish to parse.\n",
            dir.display()
        ));
    } else {
        msg.push_str(&format!(
            "There are multiple GTF files in {}.\n\
             Please specify a GTF file with the --gtf-file option.\n\
             The GTF files found are: {:?}\n",
            dir.display(),
            candidates
        ));
    }
    msg.push_str(&format!("Example usage: {}", EXAMPLE_USAGE));
    msg
}

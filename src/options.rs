use clap::ValueEnum;
use tracing::warn;

/// What to do with a record whose attribute column contains a token that is
/// not of the form `key "value"`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MalformedPolicy {
    /// Drop the whole record and keep going. A dropped exon no longer counts
    /// towards the CDS length of its transcript.
    SkipRecord,
    /// Ignore only the offending token; the record is kept with the attributes that did parse.
    #[default]
    SkipToken,
    /// Stop the run with an error.
    Abort,
}

impl std::fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MalformedPolicy::SkipRecord => write!(f, "skip-record"),
            MalformedPolicy::SkipToken => write!(f, "skip-token"),
            MalformedPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Options controlling how the transcript table is built and written.
#[derive(Copy, Clone, Debug)]
pub struct TableOptions {
    pub malformed: MalformedPolicy,
    /// Turn data-quality warnings (orphan exons) into errors.
    pub strict: bool,
    /// Write a leading, unnamed, 0-based row index column.
    pub row_index: bool,
}

impl Default for TableOptions {
    fn default() -> TableOptions {
        TableOptions {
            malformed: MalformedPolicy::default(),
            strict: false,
            row_index: true,
        }
    }
}

impl TableOptions {
    pub fn new(malformed: MalformedPolicy, strict: bool, row_index: bool) -> TableOptions {
        if strict && malformed == MalformedPolicy::SkipRecord {
            warn!("Strict mode is set but records with malformed attributes will still be skipped; exons skipped this way shorten the CDS length of their transcript.")
        }
        TableOptions {
            malformed,
            strict,
            row_index,
        }
    }
}

//! gtf-txinfo summarises the transcripts of a [GTF](https://www.ensembl.org/info/website/upload/gff.html)
//! annotation file. For every `transcript` record it reports the genomic span,
//! the summed length of its exons (`CDS Length`), the difference between the two
//! (`Intronic Length`) and a handful of annotation attributes. It can also pick
//! the longest transcript of each gene, either by span or by exon length.
//!
//! The tables are held in [Polars](https://pola.rs/) data frames and written as CSV.
//!
//! ```no_run
//! use gtf_txinfo::{classify, read_gtf, longest_per_gene, LengthMetric, TableOptions, TranscriptTable};
//!
//! # fn main() -> anyhow::Result<()> {
//! let opts = TableOptions::default();
//! let records = read_gtf("Homo_sapiens.GRCh38.96.gtf")?;
//! let classified = classify(&records, opts.malformed)?;
//! let (table, _stats) = TranscriptTable::build(&classified, &opts)?;
//! let longest = longest_per_gene(&table, LengthMetric::CdsLength)?;
//! longest.write_csv("HG38.96_Longest_CDS.csv", opts.row_index)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod longest;
pub mod options;
pub mod reader;
pub mod table;
pub mod txinfo_utils;
pub use config::{run, RunConfig, RunSummary};
pub use error::TxInfoError;
pub use extract::{classify, Classified, ExtractStats};
pub use longest::{longest_per_gene, LengthMetric};
pub use options::{MalformedPolicy, TableOptions};
pub use reader::{parse_attributes, read_gtf, read_gtf_from, AttributeMap, GtfRecord};
pub use table::{TableStats, TranscriptTable};

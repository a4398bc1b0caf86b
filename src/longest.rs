use crate::table::TranscriptTable;
use crate::txinfo_utils::{CDS_LENGTH, GENE_ID, TRANSCRIPT_LENGTH};
use polars::{lazy::prelude::*, prelude::*};
use tracing::{info, warn};

/// The length used to pick the representative transcript of a gene.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LengthMetric {
    /// `Transcript Length`, the genomic span of the transcript.
    TranscriptLength,
    /// `CDS Length`, the summed length of its exons.
    CdsLength,
}

impl LengthMetric {
    pub fn column(&self) -> &'static str {
        match self {
            LengthMetric::TranscriptLength => TRANSCRIPT_LENGTH,
            LengthMetric::CdsLength => CDS_LENGTH,
        }
    }

    /// The suffix of the output file holding the table selected by this metric.
    pub fn output_suffix(&self) -> &'static str {
        match self {
            LengthMetric::TranscriptLength => "Longest_Transcript",
            LengthMetric::CdsLength => "Longest_CDS",
        }
    }
}

impl std::fmt::Display for LengthMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Keeps one transcript per gene: the one with the largest `metric`.
///
/// When several transcripts of a gene share the maximum, the one that comes
/// first in `table` is kept. Rows keep their relative order and their row
/// index from `table`. Transcripts without a gene_id are left out.
///
/// ### Arguments
///
/// * `table` - The full [TranscriptTable] built by [TranscriptTable::build].
/// * `metric` - The [LengthMetric] that decides which transcript is the longest.
///
/// ### Returns
///
/// A new [TranscriptTable] with the same columns and at most one row per gene_id.
///
/// ### Example
///
/// ```
/// use gtf_txinfo::{classify, longest_per_gene, read_gtf_from, LengthMetric, MalformedPolicy, TableOptions, TranscriptTable};
///
/// let gtf = b"chr1\tsrc\ttranscript\t1\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\nchr1\tsrc\ttranscript\t1\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";\n";
/// let records = read_gtf_from(&gtf[..]).unwrap();
/// let classified = classify(&records, MalformedPolicy::SkipToken).unwrap();
/// let (table, _) = TranscriptTable::build(&classified, &TableOptions::default()).unwrap();
///
/// let longest = longest_per_gene(&table, LengthMetric::TranscriptLength).unwrap();
/// assert_eq!(longest.str_column("transcript_id").unwrap(), vec![Some(String::from("T2"))]);
/// ```
pub fn longest_per_gene(
    table: &TranscriptTable,
    metric: LengthMetric,
) -> anyhow::Result<TranscriptTable> {
    let metric_col = metric.column();

    let n_no_gene = table.df().column(GENE_ID)?.null_count();
    if n_no_gene > 0 {
        warn!(
            "{} transcripts have no gene_id and are left out of the longest {} table.",
            n_no_gene, metric
        );
    }

    let df = table
        .df()
        .clone()
        .lazy()
        .filter(col(GENE_ID).is_not_null())
        .filter(col(metric_col).eq(col(metric_col).max().over([col(GENE_ID)])))
        .unique_stable(Some(vec![GENE_ID.to_string()]), UniqueKeepStrategy::First)
        .collect()?;

    info!(
        "Selected {} transcripts with the longest {} out of {}.",
        df.height(),
        metric,
        table.height()
    );
    Ok(TranscriptTable::from_df(df))
}

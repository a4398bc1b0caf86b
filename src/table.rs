//! The transcript table: one row per transcript record, with the exonic and
//! intronic lengths derived from its exons.

use crate::error::TxInfoError;
use crate::extract::{Classified, ExonColumns, TranscriptColumns};
use crate::options::TableOptions;
use crate::txinfo_utils::*;
use anyhow::Context;
use polars::{frame::DataFrame, lazy::prelude::*, prelude::*, series::Series};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Data-quality counters collected while building the table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub n_rows: usize,
    /// Transcripts that have no exon record; their CDS length is 0.
    pub n_without_exons: usize,
    /// Exon records whose transcript_id is missing or matches no transcript record.
    pub n_orphan_exons: usize,
    /// Rows whose exons add up to more than the transcript span.
    pub n_negative_intronic: usize,
    pub n_duplicate_transcript_ids: usize,
}

/// A transcript table with the columns of [OUTPUT_COLUMNS] plus the
/// positional [ROW_INDEX] column.
#[derive(Clone, Debug)]
pub struct TranscriptTable {
    df: DataFrame,
}

/// Sums the exon lengths of each transcript into a `CDS Length` column.
///
/// Exons without a transcript_id belong to no transcript and are left out.
pub fn aggregate_exon_lengths(exons: &DataFrame) -> anyhow::Result<DataFrame> {
    let df = exons
        .clone()
        .lazy()
        .filter(col(TRANSCRIPT_ID).is_not_null())
        .group_by([col(TRANSCRIPT_ID)])
        .agg([col(EXON_LENGTH).sum().alias(CDS_LENGTH)])
        .collect()?;
    Ok(df)
}

/// Counts the exons that cannot be attached to any transcript, and returns the
/// transcript_id of the first one (if it has one).
fn orphan_exons(transcripts: &TranscriptColumns, exons: &ExonColumns) -> (usize, Option<String>) {
    let known: HashSet<&str> = transcripts
        .transcript_id
        .iter()
        .flatten()
        .map(|t| t.as_str())
        .collect();

    let mut orphans = exons
        .transcript_id
        .iter()
        .filter(|t| !t.as_deref().is_some_and(|t| known.contains(t)));
    let first = orphans.next();
    let count = usize::from(first.is_some()) + orphans.count();
    (count, first.cloned().flatten())
}

fn duplicated_ids(transcripts: &TranscriptColumns) -> usize {
    let mut seen = HashSet::with_capacity(transcripts.len());
    transcripts
        .transcript_id
        .iter()
        .flatten()
        .filter(|t| !seen.insert(t.as_str()))
        .count()
}

impl TranscriptTable {
    /// Joins the transcripts with the summed lengths of their exons.
    ///
    /// This is a left join: every transcript record yields exactly one row, in
    /// input order, and a transcript without exons gets a CDS length of 0.
    /// `Intronic Length` is `Transcript Length - CDS Length` and may be negative
    /// if the exons overlap or extend past the transcript.
    ///
    /// ### Arguments
    ///
    /// * `classified` - The transcript and exon records returned by [classify](crate::extract::classify).
    /// * `opts` - The [TableOptions]. With `strict` set, exons that reference an
    ///   unknown transcript_id fail the build with [TxInfoError::OrphanExons]
    ///   instead of being reported as a warning.
    ///
    /// ### Returns
    ///
    /// The [TranscriptTable], with the columns of [OUTPUT_COLUMNS] and the [ROW_INDEX]
    /// column, together with the [TableStats] collected while building it.
    ///
    /// ### Example
    ///
    /// ```no_run
    /// use gtf_txinfo::{classify, read_gtf, MalformedPolicy, TableOptions, TranscriptTable};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let records = read_gtf("Homo_sapiens.GRCh38.96.gtf")?;
    /// let classified = classify(&records, MalformedPolicy::SkipToken)?;
    /// let (table, stats) = TranscriptTable::build(&classified, &TableOptions::default())?;
    /// assert_eq!(table.height(), stats.n_rows);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(
        classified: &Classified,
        opts: &TableOptions,
    ) -> anyhow::Result<(TranscriptTable, TableStats)> {
        let mut stats = TableStats::default();

        let (n_orphans, first) = orphan_exons(&classified.transcripts, &classified.exons);
        if n_orphans > 0 {
            if opts.strict {
                return Err(TxInfoError::OrphanExons {
                    count: n_orphans,
                    first,
                }
                .into());
            }
            warn!(
                "{} exon records reference a transcript_id without a transcript record (first: {:?}); their lengths are not counted.",
                n_orphans, first
            );
        }
        stats.n_orphan_exons = n_orphans;

        stats.n_duplicate_transcript_ids = duplicated_ids(&classified.transcripts);
        if stats.n_duplicate_transcript_ids > 0 {
            warn!(
                "{} transcript records repeat a transcript_id seen earlier; they share the same CDS length.",
                stats.n_duplicate_transcript_ids
            );
        }

        let cds = aggregate_exon_lengths(&classified.exons.to_df()?)?;
        debug!("Aggregated exon lengths of {} transcripts", cds.height());

        let mut df = classified
            .transcripts
            .to_df()?
            .lazy()
            .join(
                cds.lazy(),
                [col(TRANSCRIPT_ID)],
                [col(TRANSCRIPT_ID)],
                JoinArgs::new(JoinType::Left),
            )
            .with_column(col(CDS_LENGTH).fill_null(lit(0i64)))
            .with_column((col(TRANSCRIPT_LENGTH) - col(CDS_LENGTH)).alias(INTRONIC_LENGTH))
            .select(
                OUTPUT_COLUMNS
                    .iter()
                    .map(|&c| col(c))
                    .collect::<Vec<Expr>>(),
            )
            .collect()?;

        if df.height() != classified.transcripts.len() {
            anyhow::bail!(
                "The transcript table has {} rows but {} transcript records were found. Please report this issue via GitHub.",
                df.height(),
                classified.transcripts.len()
            );
        }

        let row_index = Series::new(ROW_INDEX, (0..df.height() as i64).collect::<Vec<i64>>());
        df.with_column(row_index)?;

        let table = TranscriptTable { df };
        stats.n_rows = table.height();
        stats.n_without_exons = table
            .i64_column(CDS_LENGTH)?
            .iter()
            .filter(|v| **v == Some(0))
            .count();
        stats.n_negative_intronic = table
            .i64_column(INTRONIC_LENGTH)?
            .iter()
            .filter(|v| v.is_some_and(|l| l < 0))
            .count();

        if stats.n_negative_intronic > 0 {
            warn!(
                "{} transcripts have a negative intronic length; their exons add up to more than the transcript span.",
                stats.n_negative_intronic
            );
        }
        info!(
            "Built the transcript table with {} rows ({} without exons).",
            stats.n_rows, stats.n_without_exons
        );
        Ok((table, stats))
    }

    pub(crate) fn from_df(df: DataFrame) -> TranscriptTable {
        TranscriptTable { df }
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Returns the values of a string column such as `transcript_id` or `gene_name`.
    pub fn str_column(&self, name: &str) -> anyhow::Result<Vec<Option<String>>> {
        Ok(self
            .df
            .column(name)?
            .str()
            .with_context(|| format!("column {:?} is not a string column", name))?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }

    /// Returns the values of an integer column such as `Start` or `CDS Length`.
    pub fn i64_column(&self, name: &str) -> anyhow::Result<Vec<Option<i64>>> {
        Ok(self
            .df
            .column(name)?
            .i64()
            .with_context(|| format!("column {:?} is not an integer column", name))?
            .into_iter()
            .collect())
    }

    /// The dataframe that is written out: the output columns, optionally
    /// preceded by an unnamed row index column.
    pub fn output_df(&self, row_index: bool) -> anyhow::Result<DataFrame> {
        if row_index {
            let mut df = self
                .df
                .select(std::iter::once(ROW_INDEX).chain(OUTPUT_COLUMNS))?;
            df.rename(ROW_INDEX, "")?;
            Ok(df)
        } else {
            Ok(self.df.select(OUTPUT_COLUMNS)?)
        }
    }

    /// Writes the table as a comma-separated file with a header line. Absent
    /// attributes are written as empty fields.
    pub fn write_csv<T: AsRef<Path>>(&self, file_path: T, row_index: bool) -> anyhow::Result<()> {
        let file_path = file_path.as_ref();

        // create the folder if it doesn't exist
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Could not create the output directory {:?}",
                        parent.as_os_str()
                    )
                })?;
            }
        }

        let mut out_df = self.output_df(row_index)?;

        let file = std::fs::File::create(file_path)
            .with_context(|| format!("Could not create {:?}", file_path.as_os_str()))?;
        let mut file = BufWriter::with_capacity(4194304, file);
        // polars writes an empty column name as `""`; the row index header cell stays bare
        writeln!(file, "{}", out_df.get_column_names().join(","))?;
        CsvWriter::new(&mut file)
            .include_header(false)
            .with_separator(b',')
            .finish(&mut out_df)?;
        file.flush()?;

        info!(
            "Wrote {} rows to {:?}",
            out_df.height(),
            file_path.as_os_str()
        );
        Ok(())
    }
}

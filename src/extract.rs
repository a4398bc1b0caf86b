//! Splits GTF records into transcripts and exons and pulls out the fields we
//! report, in columnar form so they can be handed to polars in one go.

use crate::error::TxInfoError;
use crate::options::MalformedPolicy;
use crate::reader::{parse_attributes, parse_attributes_lenient, AttributeMap, FeatureType, GtfRecord};
use crate::txinfo_utils::*;
use anyhow::bail;
use polars::prelude::*;
use tracing::{debug, warn};

/// Columnar storage of the transcript records. Missing attributes are [None].
#[derive(Clone, Debug)]
pub struct TranscriptColumns {
    pub transcript_id: Vec<Option<String>>,
    pub gene_id: Vec<Option<String>>,
    pub seqname: Vec<String>,
    pub start: Vec<i64>,
    pub end: Vec<i64>,
    pub strand: Vec<String>,
    pub source: Vec<String>,
    pub transcript_length: Vec<i64>,
    /// One column per entry of [ANNOTATION_ATTRIBUTES], in the same order.
    pub annotations: Vec<Vec<Option<String>>>,
}

impl Default for TranscriptColumns {
    fn default() -> TranscriptColumns {
        TranscriptColumns::new()
    }
}

impl TranscriptColumns {
    pub fn new() -> TranscriptColumns {
        TranscriptColumns {
            transcript_id: Vec::new(),
            gene_id: Vec::new(),
            seqname: Vec::new(),
            start: Vec::new(),
            end: Vec::new(),
            strand: Vec::new(),
            source: Vec::new(),
            transcript_length: Vec::new(),
            annotations: vec![Vec::new(); ANNOTATION_ATTRIBUTES.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.transcript_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript_id.is_empty()
    }

    fn push(&mut self, rec: &GtfRecord, attrs: &AttributeMap) {
        self.transcript_id.push(attrs.get_owned(TRANSCRIPT_ID));
        self.gene_id.push(attrs.get_owned(GENE_ID));
        self.seqname.push(rec.seqname.clone());
        self.start.push(rec.start);
        self.end.push(rec.end);
        self.strand.push(rec.strand.clone());
        self.source.push(rec.source.clone());
        self.transcript_length.push(rec.len());
        for (column, key) in self.annotations.iter_mut().zip(ANNOTATION_ATTRIBUTES) {
            column.push(attrs.get_owned(key));
        }
    }

    /// Converts the columns into a [DataFrame] whose column names are the output names.
    pub fn to_df(&self) -> anyhow::Result<DataFrame> {
        let n = self.len();
        if !(equal_length(&self.gene_id, &self.transcript_id)
            && equal_length(&self.seqname, &self.transcript_id)
            && equal_length(&self.start, &self.end)
            && equal_length(&self.start, &self.transcript_id)
            && equal_length(&self.strand, &self.transcript_id)
            && equal_length(&self.source, &self.transcript_id)
            && equal_length(&self.transcript_length, &self.transcript_id)
            && self.annotations.len() == ANNOTATION_ATTRIBUTES.len()
            && self.annotations.iter().all(|c| c.len() == n))
        {
            bail!("The transcript columns have different lengths. Please report this issue via GitHub.");
        }

        let mut columns = vec![
            Series::new(TRANSCRIPT_ID, &self.transcript_id),
            Series::new(GENE_ID, &self.gene_id),
            Series::new(CHR, &self.seqname),
            Series::new(START, &self.start),
            Series::new(STOP, &self.end),
            Series::new(STRAND, &self.strand),
            Series::new(TRANSCRIPT_LENGTH, &self.transcript_length),
            Series::new(SOURCE, &self.source),
        ];
        columns.extend(
            ANNOTATION_ATTRIBUTES
                .iter()
                .zip(self.annotations.iter())
                .map(|(&name, values)| Series::new(name, values)),
        );

        Ok(DataFrame::new(columns)?)
    }
}

/// Columnar storage of the exon records, just what the length aggregation needs.
#[derive(Clone, Debug, Default)]
pub struct ExonColumns {
    pub transcript_id: Vec<Option<String>>,
    pub exon_length: Vec<i64>,
}

impl ExonColumns {
    pub fn len(&self) -> usize {
        self.transcript_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript_id.is_empty()
    }

    fn push(&mut self, rec: &GtfRecord, attrs: &AttributeMap) {
        self.transcript_id.push(attrs.get_owned(TRANSCRIPT_ID));
        self.exon_length.push(rec.len());
    }

    pub fn to_df(&self) -> anyhow::Result<DataFrame> {
        if !equal_length(&self.transcript_id, &self.exon_length) {
            bail!("The exon columns have different lengths. Please report this issue via GitHub.");
        }
        Ok(DataFrame::new(vec![
            Series::new(TRANSCRIPT_ID, &self.transcript_id),
            Series::new(EXON_LENGTH, &self.exon_length),
        ])?)
    }
}

/// Counters collected while classifying records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub n_transcripts: usize,
    pub n_exons: usize,
    /// Records of any other feature type (gene, CDS, UTR, ...).
    pub n_other: usize,
    /// Transcript or exon records dropped because of a malformed attribute column.
    pub n_skipped_records: usize,
    /// Attribute tokens ignored under [MalformedPolicy::SkipToken].
    pub n_dropped_tokens: usize,
}

/// The result of [classify].
#[derive(Clone, Debug, Default)]
pub struct Classified {
    pub transcripts: TranscriptColumns,
    pub exons: ExonColumns,
    pub stats: ExtractStats,
}

/// Parses the attributes of `rec` according to `policy`. `Ok(None)` means the
/// record should be skipped.
fn record_attributes(
    rec: &GtfRecord,
    policy: MalformedPolicy,
    stats: &mut ExtractStats,
) -> Result<Option<AttributeMap>, TxInfoError> {
    match policy {
        MalformedPolicy::SkipToken => {
            let (attrs, n_dropped) = parse_attributes_lenient(&rec.attributes);
            stats.n_dropped_tokens += n_dropped;
            Ok(Some(attrs))
        }
        MalformedPolicy::SkipRecord => match parse_attributes(&rec.attributes, rec.line_number) {
            Ok(attrs) => Ok(Some(attrs)),
            Err(e) => {
                if rec.feature() == FeatureType::Exon {
                    let (attrs, _) = parse_attributes_lenient(&rec.attributes);
                    warn!(
                        "Skipping the exon on line {}, the CDS length of transcript {:?} will not include it: {}",
                        rec.line_number,
                        attrs.get(TRANSCRIPT_ID),
                        e
                    );
                } else {
                    debug!("Skipping record: {}", e);
                }
                stats.n_skipped_records += 1;
                Ok(None)
            }
        },
        MalformedPolicy::Abort => parse_attributes(&rec.attributes, rec.line_number).map(Some),
    }
}

/// Keeps the `transcript` and `exon` records and extracts their fields.
///
/// Every transcript (or exon) record whose attributes parse yields exactly one
/// row; attributes it does not carry become [None]. What happens to records
/// whose attributes do not parse is decided by `policy`.
///
/// ### Arguments
///
/// * `records` - The records of a GTF file, as returned by [read_gtf](crate::reader::read_gtf).
/// * `policy` - The [MalformedPolicy] applied to attribute tokens that are not `key "value"`.
///   With [MalformedPolicy::SkipToken] every transcript and exon record is kept.
///
/// ### Returns
///
/// A [Classified] holding the transcript columns, the exon columns and the
/// [ExtractStats]. Under [MalformedPolicy::Abort] the first malformed token is
/// returned as [TxInfoError::MalformedAttribute].
///
/// ### Example
///
/// ```
/// use gtf_txinfo::{classify, read_gtf_from, MalformedPolicy};
///
/// let gtf = b"chr1\tsrc\ttranscript\t1\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; level 2;\n";
/// let records = read_gtf_from(&gtf[..]).unwrap();
/// let classified = classify(&records, MalformedPolicy::SkipToken).unwrap();
/// assert_eq!(classified.stats.n_transcripts, 1);
/// assert_eq!(classified.stats.n_dropped_tokens, 1);
/// ```
pub fn classify(records: &[GtfRecord], policy: MalformedPolicy) -> anyhow::Result<Classified> {
    let mut out = Classified::default();

    for rec in records {
        let feature = rec.feature();
        if feature == FeatureType::Other {
            out.stats.n_other += 1;
            continue;
        }

        let attrs = match record_attributes(rec, policy, &mut out.stats)? {
            Some(attrs) => attrs,
            None => continue,
        };

        match feature {
            FeatureType::Transcript => {
                out.transcripts.push(rec, &attrs);
                out.stats.n_transcripts += 1;
            }
            FeatureType::Exon => {
                out.exons.push(rec, &attrs);
                out.stats.n_exons += 1;
            }
            FeatureType::Other => unreachable!(),
        }
    }

    if out.stats.n_skipped_records > 0 {
        warn!(
            "{} transcript/exon records were skipped because their attributes could not be parsed. Use `--malformed skip-token` to keep them.",
            out.stats.n_skipped_records
        );
    }
    if out.stats.n_dropped_tokens > 0 {
        warn!(
            "{} attribute tokens were ignored because they are not of the form key \"value\".",
            out.stats.n_dropped_tokens
        );
    }
    if out.transcripts.is_empty() {
        warn!("Found no transcript records; the transcript table will be empty.");
    }

    let n_missing_tid = out.transcripts.transcript_id.iter().filter(|t| t.is_none()).count();
    if n_missing_tid > 0 {
        warn!("{} transcript records have no transcript_id attribute.", n_missing_tid);
    }

    debug!(
        "Classified {} transcripts, {} exons and {} other records.",
        out.stats.n_transcripts, out.stats.n_exons, out.stats.n_other
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_gtf_from;

    const GTF: &[u8] = b"chr1\tensembl\tgene\t100\t300\t.\t+\t.\tgene_id \"G1\"; gene_name \"ONE\";\nchr1\tensembl\ttranscript\t100\t199\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\"; gene_name \"ONE\"; tag \"basic\";\nchr1\tensembl\texon\t100\t149\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\nchr1\tensembl\texon\t180\t199\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\nchr1\thavana\ttranscript\t150\t300\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T2\"; level 2;\nchr1\thavana\texon\t150\t160\t.\t-\t.\tgene_id \"G1\"; transcript_id \"T2\"; level 2;\n";

    #[test]
    fn classify_skip_record_drops_malformed_records() {
        let records = read_gtf_from(GTF).unwrap();
        let cl = classify(&records, MalformedPolicy::SkipRecord).unwrap();
        assert_eq!(
            cl.stats,
            ExtractStats {
                n_transcripts: 1,
                n_exons: 2,
                n_other: 1,
                n_skipped_records: 2,
                n_dropped_tokens: 0,
            }
        );
        assert_eq!(cl.transcripts.transcript_id, vec![Some(String::from("T1"))]);
        assert_eq!(cl.transcripts.transcript_length, vec![100]);
        assert_eq!(cl.exons.exon_length, vec![50, 20]);
    }

    #[test]
    fn classify_skip_token_keeps_records() {
        let records = read_gtf_from(GTF).unwrap();
        let cl = classify(&records, MalformedPolicy::SkipToken).unwrap();
        assert_eq!(cl.stats.n_transcripts, 2);
        assert_eq!(cl.stats.n_exons, 3);
        assert_eq!(cl.stats.n_dropped_tokens, 2);
        assert_eq!(cl.transcripts.strand, vec!["+", "-"]);
        assert_eq!(cl.transcripts.source, vec!["ensembl", "havana"]);
        assert_eq!(cl.transcripts.transcript_length, vec![100, 151]);
    }

    #[test]
    fn classify_abort_propagates() {
        let records = read_gtf_from(GTF).unwrap();
        let err = classify(&records, MalformedPolicy::Abort).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxInfoError>(),
            Some(TxInfoError::MalformedAttribute { line: 5, .. })
        ));
    }

    #[test]
    fn absent_attributes_are_none() {
        let records = read_gtf_from(GTF).unwrap();
        let cl = classify(&records, MalformedPolicy::SkipRecord).unwrap();
        let pos = |key: &str| ANNOTATION_ATTRIBUTES.iter().position(|&a| a == key).unwrap();
        assert_eq!(cl.transcripts.annotations[pos("gene_name")], vec![Some(String::from("ONE"))]);
        assert_eq!(cl.transcripts.annotations[pos("tag")], vec![Some(String::from("basic"))]);
        assert_eq!(cl.transcripts.annotations[pos("gene_biotype")], vec![None]);
        assert_eq!(cl.transcripts.annotations[pos("transcript_support_level")], vec![None]);
    }

    #[test]
    fn to_df_has_one_row_per_transcript() {
        let records = read_gtf_from(GTF).unwrap();
        let cl = classify(&records, MalformedPolicy::SkipToken).unwrap();
        let df = cl.transcripts.to_df().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 8 + ANNOTATION_ATTRIBUTES.len());
        assert_eq!(df.column("gene_biotype").unwrap().null_count(), 2);

        let exons = cl.exons.to_df().unwrap();
        assert_eq!(exons.height(), 3);
    }
}

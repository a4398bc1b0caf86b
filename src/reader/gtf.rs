use crate::error::TxInfoError;
use crate::txinfo_utils::is_gzipped;
use anyhow::Context;
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

const N_GTF_COLUMNS: usize = 9;

/// The feature types we care about. Everything else is counted and ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeatureType {
    Transcript,
    Exon,
    Other,
}

impl FeatureType {
    /// Maps the third GTF column onto a [FeatureType].
    pub fn from_type(s: &str) -> FeatureType {
        match s {
            "transcript" => FeatureType::Transcript,
            "exon" => FeatureType::Exon,
            _ => FeatureType::Other,
        }
    }
}

/// One record line of a GTF file, with the attribute column kept as raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GtfRecord {
    /// 1-based line number in the file, used in error messages.
    pub line_number: usize,
    pub seqname: String,
    pub source: String,
    pub feature_type: String,
    pub start: i64,
    pub end: i64,
    pub score: String,
    pub strand: String,
    pub frame: String,
    pub attributes: String,
}

impl GtfRecord {
    /// Parses one tab-separated record line.
    ///
    /// The attribute column is the remainder of the line after the eighth tab,
    /// so it is kept whole even if it contains a stray tab.
    pub fn parse_line(line: &str, line_number: usize) -> Result<GtfRecord, TxInfoError> {
        let fields: Vec<&str> = line.splitn(N_GTF_COLUMNS, '\t').collect();
        if fields.len() != N_GTF_COLUMNS {
            return Err(TxInfoError::MalformedRecord {
                line: line_number,
                found: fields.len(),
            });
        }

        let start = parse_coordinate(fields[3], "start", line_number)?;
        let end = parse_coordinate(fields[4], "stop", line_number)?;
        // 1-based and closed, so every record spans at least one base
        if start < 1 || end < start {
            return Err(TxInfoError::InvalidInterval {
                line: line_number,
                start,
                stop: end,
            });
        }

        Ok(GtfRecord {
            line_number,
            seqname: fields[0].to_string(),
            source: fields[1].to_string(),
            feature_type: fields[2].to_string(),
            start,
            end,
            score: fields[5].to_string(),
            strand: fields[6].to_string(),
            frame: fields[7].to_string(),
            attributes: fields[8].to_string(),
        })
    }

    pub fn feature(&self) -> FeatureType {
        FeatureType::from_type(&self.feature_type)
    }

    /// Length of the closed interval `[start, end]`.
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

fn parse_coordinate(value: &str, field: &'static str, line: usize) -> Result<i64, TxInfoError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| TxInfoError::TypeCoercion {
            line,
            field,
            value: value.to_string(),
        })
}

/// Reads all records of the GTF file at `file_path`. Gzipped files are detected
/// and decompressed on the fly.
pub fn read_gtf<T: AsRef<Path>>(file_path: T) -> anyhow::Result<Vec<GtfRecord>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("Could not open the GTF file {:?}", file_path.as_os_str()))?;
    let mut inner_rdr = BufReader::new(file);

    let records = if is_gzipped(&mut inner_rdr)? {
        info!("auto-detected gzipped file - reading via decompression");
        read_gtf_from(BufReader::new(MultiGzDecoder::new(inner_rdr)))
    } else {
        read_gtf_from(inner_rdr)
    }
    .with_context(|| format!("Failed parsing the GTF file {:?}", file_path.as_os_str()))?;

    Ok(records)
}

/// Reads all records from an uncompressed GTF stream.
///
/// Leading `#!` header lines are skipped before parsing begins. Any later line
/// starting with `#` is treated as a comment, and blank lines are ignored.
pub fn read_gtf_from<R: BufRead>(rdr: R) -> anyhow::Result<Vec<GtfRecord>> {
    let mut records = Vec::with_capacity(1_0000);
    let mut n_header = 0usize;
    let mut n_comments = 0usize;
    let mut in_header = true;

    for (i, l) in rdr.lines().enumerate() {
        let line = l?;
        let line = line.trim_end_matches(['\r', '\n']);

        if in_header && line.starts_with("#!") {
            n_header += 1;
            continue;
        }
        in_header = false;

        if line.starts_with('#') {
            n_comments += 1;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let record = GtfRecord::parse_line(line, i + 1)?;
        records.push(record);
    }

    debug!("Skipped {} header lines", n_header);
    info!(
        "Finished parsing the input file. Found {} comments and {} records.",
        n_comments,
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GTF_RECORD: &[u8] = b"#!genome-build GRCh38.p12\n#!genome-version GRCh38\n#!genebuild-last-updated 2019-01\n1\thavana\tgene\t11869\t14409\t.\t+\t.\tgene_id \"ENSG00000223972\"; gene_version \"5\"; gene_name \"DDX11L1\"; gene_source \"havana\"; gene_biotype \"transcribed_unprocessed_pseudogene\";\n1\thavana\ttranscript\t11869\t14409\t.\t+\t.\tgene_id \"ENSG00000223972\"; gene_version \"5\"; transcript_id \"ENST00000456328\"; transcript_version \"2\"; gene_name \"DDX11L1\"; gene_source \"havana\"; gene_biotype \"transcribed_unprocessed_pseudogene\"; transcript_name \"DDX11L1-202\"; transcript_source \"havana\"; transcript_biotype \"processed_transcript\"; tag \"basic\"; transcript_support_level \"1\";\n1\thavana\texon\t11869\t12227\t.\t+\t.\tgene_id \"ENSG00000223972\"; gene_version \"5\"; transcript_id \"ENST00000456328\"; transcript_version \"2\"; exon_number \"1\"; gene_name \"DDX11L1\"; exon_id \"ENSE00002234944\"; exon_version \"1\"; tag \"basic\"; transcript_support_level \"1\";\n# a comment in the middle\n\n1\thavana\texon\t12613\t12721\t.\t+\t.\tgene_id \"ENSG00000223972\"; gene_version \"5\"; transcript_id \"ENST00000456328\"; transcript_version \"2\"; exon_number \"2\"; gene_name \"DDX11L1\"; exon_id \"ENSE00003582793\"; exon_version \"1\"; tag \"basic\"; transcript_support_level \"1\";\n";

    #[test]
    fn test_read_gtf_from() {
        let records = read_gtf_from(GTF_RECORD).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(
            records
                .iter()
                .map(|r| r.feature())
                .collect::<Vec<FeatureType>>(),
            vec![
                FeatureType::Other,
                FeatureType::Transcript,
                FeatureType::Exon,
                FeatureType::Exon
            ]
        );
        assert_eq!(
            records.iter().map(|r| r.line_number).collect::<Vec<_>>(),
            vec![4, 5, 6, 9]
        );

        let txp = &records[1];
        assert_eq!(txp.seqname, "1");
        assert_eq!(txp.source, "havana");
        assert_eq!(txp.start, 11869);
        assert_eq!(txp.end, 14409);
        assert_eq!(txp.len(), 2541);
        assert_eq!(txp.score, ".");
        assert_eq!(txp.strand, "+");
        assert_eq!(txp.frame, ".");
        assert!(txp.attributes.starts_with("gene_id \"ENSG00000223972\";"));
        assert_eq!(records[3].len(), 109);
    }

    #[test]
    fn header_marker_only_counts_at_the_top() {
        let gtf = b"#!header\nchr1\tsrc\texon\t1\t10\t.\t+\t.\ttranscript_id \"T1\";\n#!late\n";
        let records = read_gtf_from(&gtf[..]).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn non_integer_start_is_fatal() {
        let gtf = b"chr1\tsrc\texon\tone\t10\t.\t+\t.\ttranscript_id \"T1\";\n";
        let err = read_gtf_from(&gtf[..]).unwrap_err();
        match err.downcast_ref::<TxInfoError>() {
            Some(TxInfoError::TypeCoercion { line, field, value }) => {
                assert_eq!(*line, 1);
                assert_eq!(*field, "start");
                assert_eq!(value, "one");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn stop_before_start_is_fatal() {
        let gtf = b"chr1\tsrc\texon\t20\t10\t.\t+\t.\ttranscript_id \"T1\";\n";
        let err = read_gtf_from(&gtf[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxInfoError>(),
            Some(TxInfoError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn start_below_one_is_fatal() {
        let gtf = b"chr1\tsrc\texon\t0\t10\t.\t+\t.\ttranscript_id \"T1\";\n";
        let err = read_gtf_from(&gtf[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxInfoError>(),
            Some(TxInfoError::InvalidInterval { line: 1, start: 0, stop: 10 })
        ));

        let err = GtfRecord::parse_line(
            "chr1\tsrc\texon\t-9223372036854775808\t9223372036854775807\t.\t+\t.\ttranscript_id \"T1\";",
            3,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TxInfoError::InvalidInterval { line: 3, start: i64::MIN, stop: i64::MAX }
        ));
    }

    #[test]
    fn widest_interval_has_no_overflow() {
        let rec = GtfRecord::parse_line(
            "chr1\tsrc\texon\t1\t9223372036854775807\t.\t+\t.\ttranscript_id \"T1\";",
            1,
        )
        .unwrap();
        assert_eq!(rec.len(), i64::MAX);
    }

    #[test]
    fn feature_types() {
        assert_eq!(FeatureType::from_type("transcript"), FeatureType::Transcript);
        assert_eq!(FeatureType::from_type("exon"), FeatureType::Exon);
        assert_eq!(FeatureType::from_type("CDS"), FeatureType::Other);
        assert_eq!(FeatureType::from_type("Exon"), FeatureType::Other);
    }

    #[test]
    fn short_line_is_fatal() {
        let gtf = b"chr1\tsrc\texon\t1\t10\n";
        let err = read_gtf_from(&gtf[..]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TxInfoError>(),
            Some(TxInfoError::MalformedRecord { line: 1, found: 5 })
        ));
    }

    #[test]
    fn single_base_record_has_length_one() {
        let rec = GtfRecord::parse_line(
            "chr1\tsrc\texon\t5\t5\t.\t-\t.\ttranscript_id \"T1\";",
            1,
        )
        .unwrap();
        assert_eq!(rec.len(), 1);
        assert!(!rec.is_empty());
    }
}

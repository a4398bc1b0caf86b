use std::io::BufRead;

pub const TRANSCRIPT_ID: &str = "transcript_id";
pub const GENE_ID: &str = "gene_id";
pub const CHR: &str = "Chr";
pub const START: &str = "Start";
pub const STOP: &str = "Stop";
pub const STRAND: &str = "Strand";
pub const SOURCE: &str = "Source";
pub const TRANSCRIPT_LENGTH: &str = "Transcript Length";
pub const CDS_LENGTH: &str = "CDS Length";
pub const INTRONIC_LENGTH: &str = "Intronic Length";
pub const EXON_LENGTH: &str = "exon_length";

/// Internal name of the positional row index. It is written as an unnamed
/// leading column, the way pandas writes its index.
pub const ROW_INDEX: &str = "row_index";

/// The optional annotation attributes copied from each transcript record, in
/// the order they are stored in [TranscriptColumns](crate::extract::TranscriptColumns).
pub const ANNOTATION_ATTRIBUTES: [&str; 8] = [
    "gene_version",
    "gene_name",
    "gene_biotype",
    "transcript_name",
    "transcript_biotype",
    "transcript_version",
    "transcript_support_level",
    "tag",
];

/// Column order of every transcript table we write.
pub const OUTPUT_COLUMNS: [&str; 18] = [
    TRANSCRIPT_ID,
    GENE_ID,
    CHR,
    START,
    STOP,
    STRAND,
    TRANSCRIPT_LENGTH,
    CDS_LENGTH,
    INTRONIC_LENGTH,
    "gene_name",
    "gene_biotype",
    "gene_version",
    "transcript_name",
    "transcript_biotype",
    "transcript_version",
    "transcript_support_level",
    "tag",
    SOURCE,
];

// Returns `true` if the input vectors are of equal length and false otherwise.
pub fn equal_length<T, R>(vec1: &[T], vec2: &[R]) -> bool {
    vec1.len() == vec2.len()
}

/// Tests if the stream underlying the [BufRead] `reader` is gzipped or not by examining the
/// first 2 bytes for the magic header.  This function *requires*, but does not check, that
/// none of the stream has yet been consumed (i.e. that no read calls have yet been issued
/// to `reader`). It will fill the buffer to examine the first two bytes, but will not consume
/// them.
///
/// If the first 2 bytes could be succesfully read, this returns
/// [Ok]`(true)` if the file is a gzipped file
/// [Ok]`(false)` if it is not a gzipped file
///
/// If the first 2 bytes could not be succesfully read, then this
/// returns the relevant [std::io::Error].
pub fn is_gzipped<T: BufRead>(reader: &mut T) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    if src.get(..2) == Some(&GZIP_MAGIC_NUMBER) {
        Ok(true)
    } else {
        Ok(false)
    }
}

//! Resolving what to read and where to write, and running the whole pipeline.

use crate::error::TxInfoError;
use crate::extract::{classify, ExtractStats};
use crate::longest::{longest_per_gene, LengthMetric};
use crate::options::TableOptions;
use crate::reader::read_gtf;
use crate::table::{TableStats, TranscriptTable};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const TRANSCRIPT_INFO_SUFFIX: &str = "Transcript_information";

/// Looks for the single `*.gtf` file in `dir`.
///
/// Fails with [TxInfoError::InputDiscovery] if there is none, or more than one.
pub fn discover_gtf<T: AsRef<Path>>(dir: T) -> Result<PathBuf, TxInfoError> {
    let dir = dir.as_ref();
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "gtf") {
            candidates.push(path);
        }
    }
    candidates.sort();

    if candidates.len() == 1 {
        let found = candidates.remove(0);
        info!("Using the GTF file found in the working directory: {:?}", found);
        Ok(found)
    } else {
        Err(TxInfoError::InputDiscovery {
            dir: dir.to_path_buf(),
            candidates,
        })
    }
}

/// The default output prefix: the input path with its last extension removed.
pub fn derive_prefix<T: AsRef<Path>>(input: T) -> PathBuf {
    input.as_ref().with_extension("")
}

/// Everything needed for one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub input: PathBuf,
    pub prefix: PathBuf,
    pub longest_transcript: bool,
    pub longest_cds: bool,
    pub table: TableOptions,
}

impl RunConfig {
    /// Resolves the input file (discovering it in `cwd` if not given) and the output prefix.
    pub fn resolve<T: AsRef<Path>>(
        input: Option<PathBuf>,
        prefix: Option<PathBuf>,
        cwd: T,
        longest_transcript: bool,
        longest_cds: bool,
        table: TableOptions,
    ) -> Result<RunConfig, TxInfoError> {
        let input = match input {
            Some(p) => p,
            None => discover_gtf(cwd)?,
        };
        let prefix = prefix.unwrap_or_else(|| derive_prefix(&input));
        Ok(RunConfig {
            input,
            prefix,
            longest_transcript,
            longest_cds,
            table,
        })
    }

    /// `<prefix>_<suffix>.csv`
    pub fn output_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.prefix.clone().into_os_string();
        name.push(format!("_{}.csv", suffix));
        PathBuf::from(name)
    }

    /// The metrics for which a longest-per-gene table was requested.
    pub fn metrics(&self) -> Vec<LengthMetric> {
        let mut metrics = Vec::with_capacity(2);
        if self.longest_transcript {
            metrics.push(LengthMetric::TranscriptLength);
        }
        if self.longest_cds {
            metrics.push(LengthMetric::CdsLength);
        }
        metrics
    }
}

/// What a run produced.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub extract: ExtractStats,
    pub table: TableStats,
    /// Every file written, with its number of rows.
    pub outputs: Vec<(PathBuf, usize)>,
    pub elapsed: Duration,
}

/// Reads the GTF file, builds the transcript table and writes it, together with
/// the requested longest-per-gene tables.
pub fn run(config: &RunConfig) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    let records = read_gtf(&config.input)?;
    debug!("read {} records in {:?}", records.len(), start.elapsed());

    let classified = classify(&records, config.table.malformed)?;
    drop(records);

    let (table, table_stats) = TranscriptTable::build(&classified, &config.table)?;
    debug!("built the transcript table in {:?}", start.elapsed());

    let mut outputs = Vec::with_capacity(3);
    let path = config.output_path(TRANSCRIPT_INFO_SUFFIX);
    table
        .write_csv(&path, config.table.row_index)
        .with_context(|| format!("Failed writing the transcript table to {:?}", path))?;
    outputs.push((path, table.height()));

    for metric in config.metrics() {
        let longest = longest_per_gene(&table, metric)?;
        let path = config.output_path(metric.output_suffix());
        longest
            .write_csv(&path, config.table.row_index)
            .with_context(|| format!("Failed writing the longest {} table to {:?}", metric, path))?;
        outputs.push((path, longest.height()));
    }

    let elapsed = start.elapsed();
    info!("Finished in {:?}", elapsed);
    Ok(RunSummary {
        extract: classified.stats,
        table: table_stats,
        outputs,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn discovery_needs_exactly_one_gtf() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let err = discover_gtf(dir.path()).unwrap_err();
        assert!(matches!(err, TxInfoError::InputDiscovery { ref candidates, .. } if candidates.is_empty()));

        File::create(dir.path().join("a.gtf")).unwrap();
        assert_eq!(discover_gtf(dir.path()).unwrap(), dir.path().join("a.gtf"));

        File::create(dir.path().join("b.gtf")).unwrap();
        match discover_gtf(dir.path()).unwrap_err() {
            TxInfoError::InputDiscovery { candidates, .. } => assert_eq!(
                candidates,
                vec![dir.path().join("a.gtf"), dir.path().join("b.gtf")]
            ),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn prefix_drops_last_extension() {
        assert_eq!(
            derive_prefix("data/Homo_sapiens.GRCh38.96.gtf"),
            PathBuf::from("data/Homo_sapiens.GRCh38.96")
        );
        assert_eq!(derive_prefix("x.gtf.gz"), PathBuf::from("x.gtf"));
    }

    #[test]
    fn output_paths_use_prefix() {
        let config = RunConfig::resolve(
            Some(PathBuf::from("in/genes.gtf")),
            Some(PathBuf::from("out/HG38.96")),
            ".",
            true,
            false,
            TableOptions::default(),
        )
        .unwrap();
        assert_eq!(
            config.output_path(TRANSCRIPT_INFO_SUFFIX),
            PathBuf::from("out/HG38.96_Transcript_information.csv")
        );
        assert_eq!(
            config.output_path(LengthMetric::TranscriptLength.output_suffix()),
            PathBuf::from("out/HG38.96_Longest_Transcript.csv")
        );
        assert_eq!(config.metrics(), vec![LengthMetric::TranscriptLength]);

        let config = RunConfig::resolve(
            Some(PathBuf::from("in/genes.gtf")),
            None,
            ".",
            false,
            true,
            TableOptions::default(),
        )
        .unwrap();
        assert_eq!(config.prefix, PathBuf::from("in/genes"));
        assert_eq!(config.metrics(), vec![LengthMetric::CdsLength]);
    }
}

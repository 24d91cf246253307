use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::runtime::Error;
use crate::screen::report::OrganismStat;
use crate::screen::report::ScreenTable;

///////////////////////////////
/// One completed benchmark run, ready for delivery. Immutable once
/// assembled; the receiving store keys records by sample, index and begin
/// timestamp.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub sample: String,
    pub begin_timestamp: String,
    pub end_timestamp: String,
    pub fastq_screen_version: String,
    pub threads: usize,
    pub organisms: Vec<OrganismStat>,
    pub contamination_rate: f64,
    pub fastq_screen_index: String,
    pub max_mem: f64,
    pub min_mem: f64,
    pub mean_mem: f64,
}

impl RunReport {
    /// Merge parser output, the normalized rate, timing and memory samples
    /// into one record. Pure aggregation; the memory list must hold at least
    /// the unsampled sentinel, an empty list means the invoker misbehaved.
    pub fn assemble(
        table: ScreenTable,
        contamination_rate: f64,
        begin_timestamp: String,
        end_timestamp: String,
        mem_mb: &[f64],
        threads: usize,
        sample: String,
        index_name: String,
    ) -> Result<RunReport, Error> {
        if mem_mb.is_empty() {
            return Err(Error::EmptySamples);
        }

        let max_mem = mem_mb.iter().cloned().fold(f64::MIN, f64::max);
        let min_mem = mem_mb.iter().cloned().fold(f64::MAX, f64::min);
        let mean_mem = mem_mb.iter().sum::<f64>() / mem_mb.len() as f64;

        Ok(RunReport {
            sample,
            begin_timestamp,
            end_timestamp,
            fastq_screen_version: table.version,
            threads,
            organisms: table.organisms,
            contamination_rate,
            fastq_screen_index: index_name,
            max_mem,
            min_mem,
            mean_mem,
        })
    }

    /// Serialize for transmission to the reporting collaborator
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

///////////////////////////////
/// Delivery seam for assembled reports. The production collaborator is a
/// remote store; the sweep only depends on this trait.
pub trait ReportSink {
    fn deliver(&mut self, report: &RunReport) -> anyhow::Result<()>;
}

/// Appends one JSON record per line to a local file
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: PathBuf) -> JsonLinesSink {
        JsonLinesSink { path }
    }
}

impl ReportSink for JsonLinesSink {
    fn deliver(&mut self, report: &RunReport) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", report.to_json()?)?;

        debug!(
            "delivered report for {} vs {}",
            report.sample, report.fastq_screen_index
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_table() -> ScreenTable {
        ScreenTable {
            version: "Fastq_screen version: 0.4.2".to_string(),
            header: vec!["Library".to_string(), "%Unmapped".to_string()],
            organisms: vec![OrganismStat {
                library: "phiX".to_string(),
                reads_processed: 1000.0,
                unmapped: 10.0,
                unmapped_pct: 1.0,
                one_hit_one_lib_pct: 50.0,
                multi_hit_one_lib_pct: 10.0,
                one_hit_multi_lib_pct: 5.0,
                multi_hit_multi_lib_pct: 0.0,
            }],
        }
    }

    fn assemble_with_mem(mem_mb: &[f64]) -> Result<RunReport, Error> {
        RunReport::assemble(
            test_table(),
            0.65,
            "2024-01-01T10:00:00.000000Z".to_string(),
            "2024-01-01T10:05:00.000000Z".to_string(),
            mem_mb,
            1,
            "sample1.fastq".to_string(),
            "phiX".to_string(),
        )
    }

    #[test]
    fn aggregates_memory_samples() {
        let report = assemble_with_mem(&[10.0, 30.0, 20.0]).unwrap();

        assert_eq!(report.max_mem, 30.0);
        assert_eq!(report.min_mem, 10.0);
        assert_eq!(report.mean_mem, 20.0);
    }

    #[test]
    fn sentinel_runs_report_sentinel_statistics() {
        let report = assemble_with_mem(&[-1.0]).unwrap();

        assert_eq!(report.max_mem, -1.0);
        assert_eq!(report.min_mem, -1.0);
        assert_eq!(report.mean_mem, -1.0);
    }

    #[test]
    fn empty_sample_list_is_an_internal_error() {
        let err = assemble_with_mem(&[]).unwrap_err();

        assert!(matches!(err, Error::EmptySamples));
    }

    #[test]
    fn report_serializes_with_the_tool_vocabulary() {
        let report = assemble_with_mem(&[-1.0]).unwrap();
        let json = report.to_json().unwrap();

        assert!(json.contains("\"sample\":\"sample1.fastq\""));
        assert!(json.contains("\"fastq_screen_version\""));
        assert!(json.contains("\"fastq_screen_index\":\"phiX\""));
        assert!(json.contains("\"%One_hit_one_library\":50.0"));
        assert!(json.contains("\"contamination_rate\":0.65"));
    }

    #[test]
    fn jsonl_sink_appends_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");
        let mut sink = JsonLinesSink::new(path.clone());

        let report = assemble_with_mem(&[-1.0]).unwrap();
        sink.deliver(&report).unwrap();
        sink.deliver(&report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}

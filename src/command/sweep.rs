use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use anyhow::Result;
use clap::Args;
use itertools::iproduct;
use log::debug;
use log::info;
use log::warn;

use crate::runtime::Error;
use crate::screen;
use crate::screen::conf::basename;
use crate::screen::AlignerVariant;
use crate::screen::JsonLinesSink;
use crate::screen::ReportSink;
use crate::screen::RunReport;
use crate::screen::ScreenConf;
use crate::utils;

pub const DEFAULT_PATH_WORK: &str = "screen_work";
pub const DEFAULT_PATH_REPORTS: &str = "screen_reports.jsonl";
pub const DEFAULT_SCREEN_BINARY: &str = "fastq_screen";
pub const DEFAULT_THREADS: usize = 1;

const CONF_NAME: &str = "fastq_screen.conf";

#[derive(Args)]
pub struct SweepCMD {
    // Directory of synthetic read files (.fq/.fastq)
    #[arg(short = 'i', value_parser = clap::value_parser!(PathBuf))]
    pub path_reads: PathBuf,

    // Root directory with one entry per reference; bowtie indices are
    // expected below it
    #[arg(short = 'r', value_parser = clap::value_parser!(PathBuf))]
    pub path_reference: PathBuf,

    // Fully resolved bowtie2 index prefixes; required with --aligner bowtie2
    #[arg(long = "index", value_parser = clap::value_parser!(PathBuf))]
    pub indices: Vec<PathBuf>,

    // Work directory for the tool's output, fully reset between pairs
    #[arg(short = 'w', value_parser = clap::value_parser!(PathBuf), default_value = DEFAULT_PATH_WORK)]
    pub path_work: PathBuf,

    // The screen tool binary to benchmark
    #[arg(short = 'b', value_parser = clap::value_parser!(PathBuf), default_value = DEFAULT_SCREEN_BINARY)]
    pub screen_binary: PathBuf,

    #[arg(long = "aligner", value_enum, default_value_t = AlignerVariant::Bowtie)]
    pub aligner: AlignerVariant,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize), default_value_t = DEFAULT_THREADS)]
    pub num_threads: usize,

    // Disable per-run memory sampling
    #[arg(long = "no-mem")]
    pub no_mem: bool,

    // Where delivered reports are appended, one JSON record per line
    #[arg(short = 'o', value_parser = clap::value_parser!(PathBuf), default_value = DEFAULT_PATH_REPORTS)]
    pub path_out: PathBuf,
}

impl SweepCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let references = match self.aligner {
            AlignerVariant::Bowtie => discover_references(&self.path_reference)?,
            AlignerVariant::Bowtie2 => {
                if self.indices.is_empty() {
                    anyhow::bail!(
                        "bowtie2 runs need at least one --index path (fully resolved index prefix)"
                    );
                }
                self.indices.clone()
            }
        };

        let params = SweepParams {
            path_reads: self.path_reads.clone(),
            reference_root: self.path_reference.clone(),
            references,
            path_work: self.path_work.clone(),
            screen_binary: self.screen_binary.clone(),
            aligner: self.aligner,
            num_threads: self.num_threads,
            sample_memory: !self.no_mem,
        };

        let mut sink = JsonLinesSink::new(self.path_out.clone());
        let outcome = Sweep::run(&params, &mut sink)?;

        println!(
            "Collected {} reports ({} pairs skipped), appended to {}",
            outcome.reports.len(),
            outcome.skipped.len(),
            self.path_out.display()
        );

        log::info!("Sweep has finished succesfully");
        Ok(())
    }
}

#[derive(Clone)]
pub struct SweepParams {
    pub path_reads: PathBuf,
    pub reference_root: PathBuf,

    //References to screen against: reference directories for bowtie,
    //resolved index prefixes for bowtie2
    pub references: Vec<PathBuf>,

    pub path_work: PathBuf,
    pub screen_binary: PathBuf,
    pub aligner: AlignerVariant,
    pub num_threads: usize,
    pub sample_memory: bool,
}

/// A (read file, reference) pair the sweep gave up on, with the reason
#[derive(Clone, Debug)]
pub struct SkippedPair {
    pub sample: String,
    pub reference: String,
    pub reason: String,
}

/// Everything one sweep produced. Owned by the caller; there is no
/// process-wide accumulation of results.
#[derive(Debug)]
pub struct SweepOutcome {
    pub reports: Vec<RunReport>,
    pub skipped: Vec<SkippedPair>,
}

///////////////////////////////
/// Benchmark sweep: runs the screen tool over the cross product of read
/// files and references, one pair at a time. Runs are sequential on purpose,
/// concurrent runs would corrupt each other's memory and timing figures.
pub struct Sweep {}

impl Sweep {
    pub fn run(params: &SweepParams, sink: &mut dyn ReportSink) -> Result<SweepOutcome, Error> {
        let read_files = discover_read_files(&params.path_reads)?;
        info!(
            "Sweeping {} read files against {} references",
            read_files.len(),
            params.references.len()
        );

        let mut outcome = SweepOutcome {
            reports: Vec::new(),
            skipped: Vec::new(),
        };

        reset_workdir(&params.path_work)?;

        for (fastq, reference) in iproduct!(&read_files, &params.references) {
            let sample = basename(fastq);
            let reference_id = basename(reference);

            match Self::run_pair(params, fastq, reference) {
                Ok(Some(report)) => {
                    // Delivery is best effort; a dead collaborator must not
                    // cost us the measurement
                    if let Err(e) = sink.deliver(&report) {
                        warn!("Failed to deliver report for {}: {}", report.sample, e);
                    }
                    outcome.reports.push(report);
                }
                Ok(None) => {
                    // The tool produces no table for degenerate inputs
                    debug!("No screen output for {} vs {}", sample, reference_id);
                }
                Err(e) if aborts_sweep(&e) => return Err(e),
                Err(e) => {
                    warn!("Skipping {} vs {}: {}", sample, reference_id, e);
                    outcome.skipped.push(SkippedPair {
                        sample,
                        reference: reference_id,
                        reason: e.to_string(),
                    });
                }
            }

            // Unconditional reset, so a stale table from this lap can never
            // be mistaken for the next lap's output
            reset_workdir(&params.path_work)?;
        }

        Ok(outcome)
    }

    /// One lap: write the conf, run the tool, parse its table, normalize and
    /// assemble. Ok(None) means the tool legitimately produced no output.
    fn run_pair(
        params: &SweepParams,
        fastq: &Path,
        reference: &Path,
    ) -> Result<Option<RunReport>, Error> {
        let sample = basename(fastq);
        let reference_id = basename(reference);

        let conf = ScreenConf::single(
            reference,
            &params.reference_root,
            params.num_threads,
            params.aligner,
        );
        let path_conf = params.path_work.join(CONF_NAME);
        fs::write(&path_conf, conf.render())?;

        let mut cmd = Command::new(&params.screen_binary);
        cmd.arg("--aligner")
            .arg(params.aligner.name())
            .arg("--outdir")
            .arg(&params.path_work)
            .arg("--conf")
            .arg(&path_conf)
            .arg(fastq);

        let invocation = screen::invoke(&mut cmd, params.sample_memory)?;
        if !invocation.status.success() {
            return Err(Error::tool_execution(
                "fastq_screen",
                utils::command_to_string(&cmd),
                Some(format!("{}", invocation.status)),
            ));
        }

        let path_table = params.path_work.join(screen_table_name(&sample));
        if !path_table.exists() {
            return Ok(None);
        }

        let file = File::open(&path_table)?;
        let table = screen::parse_screen_table(BufReader::new(file), &reference_id)?;
        let rate = screen::contamination_rate(&table.organisms)?;

        let report = RunReport::assemble(
            table,
            rate,
            invocation.begin,
            invocation.end,
            &invocation.mem_mb,
            params.num_threads,
            sample,
            reference_id,
        )?;

        Ok(Some(report))
    }
}

/// Errors no later pair can recover from; everything else skips the pair
fn aborts_sweep(e: &Error) -> bool {
    matches!(
        e,
        Error::ToolNotExecutable { .. } | Error::EmptySamples | Error::EmptyInput | Error::Io(_)
    )
}

/// The tool names its table after the read file: <stem>_screen.txt
fn screen_table_name(sample: &str) -> String {
    let stem = match sample.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => sample,
    };
    format!("{}_screen.txt", stem)
}

/// Remove and recreate the work directory. Idempotent; an empty directory
/// stays an empty directory.
pub fn reset_workdir(path: &Path) -> Result<(), Error> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Synthetic read files in a directory (.fq/.fastq), sorted for stable order
fn discover_read_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_fastq = path
            .extension()
            .map(|e| e == "fq" || e == "fastq")
            .unwrap_or(false);
        if path.is_file() && is_fastq {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// References to screen against: every entry below the reference root
fn discover_references(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut references = Vec::new();
    for entry in fs::read_dir(root)? {
        references.push(entry?.path());
    }
    references.sort();
    Ok(references)
}

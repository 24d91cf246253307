use std::io::ErrorKind;
use std::process::Command;
use std::process::ExitStatus;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::SecondsFormat;
use chrono::Utc;
use log::debug;

use crate::runtime::Error;
use crate::utils::procmem;

/// Sentinel occupying the sample list when memory was not measured
pub const MEM_UNSAMPLED: f64 = -1.0;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of one external tool run: exit status, resident-memory samples
/// (MB, chronological) and the wall-clock window of the run
#[derive(Debug)]
pub struct Invocation {
    pub status: ExitStatus,
    pub mem_mb: Vec<f64>,
    pub begin: String,
    pub end: String,
}

///////////////////////////////
/// Launch the external tool and block until it has fully terminated.
///
/// `begin` is stamped immediately before the spawn and `end` immediately
/// after the wait returns. With `sample_memory` set, a background thread
/// samples the resident set of the child's whole process tree at a fixed
/// interval; it is joined before this function returns, so no sample is lost
/// or delivered late. When sampling is off or unsupported on this platform,
/// the sample list is the single `MEM_UNSAMPLED` sentinel.
///
/// A non-zero exit status is surfaced in the result, not as an error; the
/// caller decides whether it is fatal for the pair. No retry, no timeout: a
/// hanging tool hangs the invoker.
pub fn invoke(cmd: &mut Command, sample_memory: bool) -> Result<Invocation, Error> {
    let begin = utc_timestamp();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            Error::tool_not_executable(cmd.get_program().to_string_lossy())
        }
        _ => Error::Io(e),
    })?;

    let sampler = if sample_memory && procmem::sampling_supported() {
        let pid = child.id();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut samples = Vec::new();
            while !stop_flag.load(Ordering::Relaxed) {
                if let Some(mb) = procmem::tree_rss_mb(pid) {
                    samples.push(mb);
                }
                thread::sleep(SAMPLE_INTERVAL);
            }
            samples
        });

        Some((stop, handle))
    } else {
        None
    };

    let status = child.wait()?;
    let end = utc_timestamp();

    let mem_mb = match sampler {
        Some((stop, handle)) => {
            stop.store(true, Ordering::Relaxed);
            let samples = handle.join().expect("memory sampler thread panicked");
            debug!("collected {} memory samples", samples.len());
            samples
        }
        None => vec![MEM_UNSAMPLED],
    };

    Ok(Invocation {
        status,
        mem_mb,
        begin,
        end,
    })
}

/// ISO-8601 UTC with a trailing Z; lexicographic order matches time order
fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsampled_run_uses_the_sentinel() {
        let mut cmd = Command::new("true");
        let inv = invoke(&mut cmd, false).unwrap();

        assert!(inv.status.success());
        assert_eq!(inv.mem_mb, vec![MEM_UNSAMPLED]);
        assert!(inv.begin <= inv.end);
    }

    #[test]
    fn missing_binary_is_a_tool_error() {
        let mut cmd = Command::new("no-such-screening-aligner");
        let err = invoke(&mut cmd, false).unwrap_err();

        assert!(matches!(err, Error::ToolNotExecutable { .. }));
    }

    #[test]
    fn failing_tool_surfaces_its_exit_status() {
        let mut cmd = Command::new("false");
        let inv = invoke(&mut cmd, false).unwrap();

        assert!(!inv.status.success());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn sampled_run_drains_the_sampler_before_returning() {
        let mut cmd = Command::new("sleep");
        cmd.arg("0.3");
        let inv = invoke(&mut cmd, true).unwrap();

        assert!(inv.status.success());
        assert!(inv.mem_mb.iter().all(|m| *m >= 0.0));
        assert!(inv.begin <= inv.end);
    }
}

//! Resident-memory sampling for a process tree via /proc.

use std::collections::HashMap;
use std::fs;

pub fn sampling_supported() -> bool {
    cfg!(target_os = "linux")
}

///////////////////////////////
/// Sum of resident memory (MB) for `pid` and all its live descendants.
/// None when the process is already gone or /proc is unreadable; individual
/// children may vanish mid-walk, those are simply not counted.
pub fn tree_rss_mb(pid: u32) -> Option<f64> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();

    for entry in fs::read_dir("/proc").ok()? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let candidate: u32 = match entry.file_name().to_string_lossy().parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        if let Some(ppid) = parent_pid(candidate) {
            children.entry(ppid).or_default().push(candidate);
        }
    }

    let mut total_kb = 0u64;
    let mut root_alive = false;
    let mut stack = vec![pid];
    while let Some(p) = stack.pop() {
        if let Some(kb) = rss_kb(p) {
            total_kb += kb;
            if p == pid {
                root_alive = true;
            }
        }
        if let Some(kids) = children.get(&p) {
            stack.extend(kids);
        }
    }

    if !root_alive {
        return None;
    }
    Some(total_kb as f64 / 1024.0)
}

/// Parent pid from /proc/<pid>/stat: the field after the parenthesized
/// command name and the single-letter state
fn parent_pid(pid: u32) -> Option<u32> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let after_comm = stat.rsplit(')').next()?;
    after_comm.split_whitespace().nth(1)?.parse().ok()
}

/// VmRSS in kB from /proc/<pid>/status
fn rss_kb(pid: u32) -> Option<u64> {
    let status = fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    status
        .lines()
        .find(|l| l.starts_with("VmRSS:"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn own_process_tree_has_resident_memory() {
        let mb = tree_rss_mb(std::process::id()).unwrap();

        assert!(mb > 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn dead_pid_yields_no_sample() {
        // pid_max on Linux caps real pids well below u32::MAX
        assert!(tree_rss_mb(u32::MAX).is_none());
    }
}

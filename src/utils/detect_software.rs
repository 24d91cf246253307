use log::debug;
use log::info;
use std::process::Command;

use crate::runtime::Error;

/// Version provenance for the aligners the screen tool drives. A report is
/// only comparable if we know which aligner build produced it.
pub fn bowtie_version() -> Result<String, Error> {
    debug!("Checking for bowtie");
    version_output("bowtie")
}

pub fn bowtie2_version() -> Result<String, Error> {
    debug!("Checking for bowtie2");
    version_output("bowtie2")
}

fn version_output(utility: &str) -> Result<String, Error> {
    if let Ok(output) = Command::new(utility).arg("--version").output() {
        info!("Found {}", utility);
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(Error::tool_not_executable(utility))
    }
}

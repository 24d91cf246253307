use anyhow::Result;
use clap::Args;

use crate::utils;

///////////////////////////////
/// Verify that the aligners the screen tool drives are installed, and print
/// their versions for provenance
#[derive(Args)]
pub struct CheckCMD {}

impl CheckCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let bowtie = utils::bowtie_version()?;
        let bowtie2 = utils::bowtie2_version()?;

        // The relevant version tokens must be present in the output
        if !bowtie.contains("bowtie") {
            anyhow::bail!("Unexpected bowtie --version output: {}", bowtie.trim());
        }
        if !bowtie2.contains("bowtie2-align") {
            anyhow::bail!("Unexpected bowtie2 --version output: {}", bowtie2.trim());
        }

        println!("bowtie: {}", first_line(&bowtie));
        println!("bowtie2: {}", first_line(&bowtie2));

        log::info!("Check has finished succesfully");
        Ok(())
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

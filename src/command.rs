use clap::Subcommand;

pub mod check;
pub mod sweep;

pub use check::CheckCMD;
pub use sweep::{SkippedPair, Sweep, SweepCMD, SweepOutcome, SweepParams};

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    Sweep(SweepCMD),
    Check(CheckCMD),
}

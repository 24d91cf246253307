pub mod conf;
pub mod invoke;
pub mod metrics;
pub mod report;
pub mod result;

pub use conf::{AlignerVariant, DatabaseEntry, ScreenConf};
pub use invoke::{invoke, Invocation, MEM_UNSAMPLED};
pub use metrics::contamination_rate;
pub use report::{parse_screen_table, OrganismStat, ScreenTable};
pub use result::{JsonLinesSink, ReportSink, RunReport};

use std::fmt::Write as FmtWrite;
use std::path::Path;
use std::path::PathBuf;

use clap::ValueEnum;

///////////////////////////////
/// Aligner the screen tool drives for one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlignerVariant {
    Bowtie,
    Bowtie2,
}

impl AlignerVariant {
    /// Lowercase token, used in the conf global section and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            AlignerVariant::Bowtie => "bowtie",
            AlignerVariant::Bowtie2 => "bowtie2",
        }
    }

    /// Uppercase token, only valid in DATABASE directives
    pub fn label(&self) -> &'static str {
        match self {
            AlignerVariant::Bowtie => "BOWTIE",
            AlignerVariant::Bowtie2 => "BOWTIE2",
        }
    }
}

/// One DATABASE directive: a reference index the tool screens against
#[derive(Clone, Debug)]
pub struct DatabaseEntry {
    pub short_name: String,
    pub index_path: PathBuf,
    pub aligner: AlignerVariant,
}

///////////////////////////////
/// Per-run configuration consumed by the screen tool. Built fresh for every
/// (read file, reference) pair and discarded once the run has been launched.
#[derive(Clone, Debug)]
pub struct ScreenConf {
    pub aligner: AlignerVariant,
    pub threads: usize,
    pub databases: Vec<DatabaseEntry>,
}

impl ScreenConf {
    /// One-database conf for a single benchmark pair.
    ///
    /// bowtie expects its index below the reference root
    /// (root/short/bowtie_index/short), never an absolute index file.
    /// bowtie2 index paths come fully resolved from the caller.
    pub fn single(
        reference: &Path,
        reference_root: &Path,
        threads: usize,
        aligner: AlignerVariant,
    ) -> ScreenConf {
        let short_name = basename(reference);
        let index_path = match aligner {
            AlignerVariant::Bowtie => reference_root
                .join(&short_name)
                .join("bowtie_index")
                .join(&short_name),
            AlignerVariant::Bowtie2 => reference.to_path_buf(),
        };

        ScreenConf {
            aligner,
            threads,
            databases: vec![DatabaseEntry {
                short_name,
                index_path,
                aligner,
            }],
        }
    }

    /// Render the tool's line-oriented conf grammar: a global section with the
    /// aligner and thread count, then one DATABASE line per reference
    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "BOWTIE\t{}", self.aligner.name()).unwrap();
        writeln!(out, "THREADS\t{}", self.threads).unwrap();
        for db in &self.databases {
            writeln!(
                out,
                "DATABASE\t{}\t{}\t{}",
                db.short_name,
                db.index_path.display(),
                db.aligner.label()
            )
            .unwrap();
        }
        out
    }
}

/// Final path component as a string; the tool refers to references by it
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bowtie_conf_joins_index_under_reference_root() {
        let conf = ScreenConf::single(
            Path::new("/data/reference/phiX"),
            Path::new("/data/reference"),
            4,
            AlignerVariant::Bowtie,
        );

        let text = conf.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "BOWTIE\tbowtie");
        assert_eq!(lines[1], "THREADS\t4");
        assert_eq!(
            lines[2],
            "DATABASE\tphiX\t/data/reference/phiX/bowtie_index/phiX\tBOWTIE"
        );
    }

    #[test]
    fn bowtie2_conf_keeps_index_path_verbatim() {
        let conf = ScreenConf::single(
            Path::new("/proj/indices/phiX174/phiX"),
            Path::new("/data/reference"),
            1,
            AlignerVariant::Bowtie2,
        );

        let text = conf.render();

        assert!(text.contains("BOWTIE\tbowtie2\n"));
        assert!(text.contains("DATABASE\tphiX\t/proj/indices/phiX174/phiX\tBOWTIE2\n"));
    }

    #[test]
    fn conf_has_exactly_one_database_line_with_uppercase_variant() {
        let conf = ScreenConf::single(
            Path::new("/data/reference/eschColi_K12"),
            Path::new("/data/reference"),
            8,
            AlignerVariant::Bowtie,
        );

        let text = conf.render();
        let db_lines: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("DATABASE\t"))
            .collect();

        assert_eq!(db_lines.len(), 1);
        let fields: Vec<&str> = db_lines[0].split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[3], "BOWTIE");
    }
}

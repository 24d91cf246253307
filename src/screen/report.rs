use std::io::BufRead;

use serde::Serialize;

use crate::runtime::Error;

// Column labels of the screen table layout this parser understands
const COL_READS_PROCESSED: &str = "#Reads_processed";
const COL_UNMAPPED: &str = "#Unmapped";
const COL_UNMAPPED_PCT: &str = "%Unmapped";
const COL_ONE_HIT_ONE_LIB_PCT: &str = "%One_hit_one_library";
const COL_MULTI_HIT_ONE_LIB_PCT: &str = "%Multiple_hits_one_library";
const COL_ONE_HIT_MULTI_LIB_PCT: &str = "%One_hit_multiple_libraries";
const COL_MULTI_HIT_MULTI_LIB_PCT: &str = "%Multiple_hits_multiple_libraries";

///////////////////////////////
/// Per-library hit statistics from one screen run. Serialized field names
/// match the tool's own column vocabulary so records stay comparable with
/// reports collected from other harnesses.
#[derive(Clone, Debug, Serialize)]
pub struct OrganismStat {
    #[serde(rename = "Library")]
    pub library: String,

    #[serde(rename = "#Reads_processed")]
    pub reads_processed: f64,

    #[serde(rename = "#Unmapped")]
    pub unmapped: f64,

    #[serde(rename = "%Unmapped")]
    pub unmapped_pct: f64,

    #[serde(rename = "%One_hit_one_library")]
    pub one_hit_one_lib_pct: f64,

    #[serde(rename = "%Multiple_hits_one_library")]
    pub multi_hit_one_lib_pct: f64,

    #[serde(rename = "%One_hit_multiple_libraries")]
    pub one_hit_multi_lib_pct: f64,

    #[serde(rename = "%Multiple_hits_multiple_libraries")]
    pub multi_hit_multi_lib_pct: f64,
}

/// Parsed screen output table: the tool's version line, the header row and
/// one OrganismStat per reference library processed
#[derive(Clone, Debug)]
pub struct ScreenTable {
    pub version: String,
    pub header: Vec<String>,
    pub organisms: Vec<OrganismStat>,
}

///////////////////////////////
/// Parse the screen tool's tab-delimited result table.
///
/// Row 1 is the version line, row 2 the column header, then one row per
/// library until a blank row or EOF (a blank row terminates parsing, it is
/// not an error). The library column of every data row is overridden with
/// `reference_id`; the tool prints its own display name there, but reports
/// are keyed by the reference the run was configured with.
pub fn parse_screen_table<R: BufRead>(reader: R, reference_id: &str) -> Result<ScreenTable, Error> {
    let mut lines = reader.lines();

    let version = match lines.next() {
        Some(line) => line?.trim_end().to_string(),
        None => {
            return Err(Error::parse_error(
                "screen table",
                Some("missing version line"),
            ))
        }
    };

    let header: Vec<String> = match lines.next() {
        Some(line) => line?
            .trim_end()
            .split('\t')
            .map(|s| s.to_string())
            .collect(),
        None => {
            return Err(Error::parse_error(
                "screen table",
                Some("missing header line"),
            ))
        }
    };

    let idx_reads = column_index(&header, COL_READS_PROCESSED)?;
    let idx_unmapped = column_index(&header, COL_UNMAPPED)?;
    let idx_unmapped_pct = column_index(&header, COL_UNMAPPED_PCT)?;
    let idx_one_one = column_index(&header, COL_ONE_HIT_ONE_LIB_PCT)?;
    let idx_multi_one = column_index(&header, COL_MULTI_HIT_ONE_LIB_PCT)?;
    let idx_one_multi = column_index(&header, COL_ONE_HIT_MULTI_LIB_PCT)?;
    let idx_multi_multi = column_index(&header, COL_MULTI_HIT_MULTI_LIB_PCT)?;

    let mut organisms = Vec::new();

    for line in lines {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            break;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != header.len() {
            return Err(Error::parse_error(
                format!("screen table row {}", organisms.len() + 3),
                Some(format!(
                    "expected {} columns, found {}",
                    header.len(),
                    fields.len()
                )),
            ));
        }

        // Columns 1.. are numeric; column 0 is the library display name,
        // which is replaced by the configured reference id
        let mut values = Vec::with_capacity(fields.len() - 1);
        for (label, field) in header.iter().zip(fields.iter()).skip(1) {
            let value: f64 = field.parse().map_err(|_| {
                Error::parse_error(
                    format!("screen table column '{}'", label),
                    Some(format!("'{}' is not numeric", field)),
                )
            })?;
            values.push(value);
        }

        organisms.push(OrganismStat {
            library: reference_id.to_string(),
            reads_processed: values[idx_reads - 1],
            unmapped: values[idx_unmapped - 1],
            unmapped_pct: values[idx_unmapped_pct - 1],
            one_hit_one_lib_pct: values[idx_one_one - 1],
            multi_hit_one_lib_pct: values[idx_multi_one - 1],
            one_hit_multi_lib_pct: values[idx_one_multi - 1],
            multi_hit_multi_lib_pct: values[idx_multi_multi - 1],
        });
    }

    Ok(ScreenTable {
        version,
        header,
        organisms,
    })
}

/// Position of a named column; must sit right of the library column
fn column_index(header: &[String], name: &str) -> Result<usize, Error> {
    match header.iter().position(|h| h == name) {
        Some(0) | None => Err(Error::parse_error(
            "screen table header",
            Some(format!("missing column '{}'", name)),
        )),
        Some(idx) => Ok(idx),
    }
}

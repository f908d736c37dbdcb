// src/utils/manifest.rs: sample sheet loading and grouping
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::config::defs::{PipelineError, GROUP_COLUMN, READ1_COLUMN, READ2_COLUMN};

/// One sample sheet row, paths as written (relative to the base directory).
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    pub group: Option<String>,
    pub read1: String,
    pub read2: String,
}

/// Rows sharing a group label, in sheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGroup {
    pub label: String,
    pub rows: Vec<ManifestRow>,
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Parses a sample sheet. The `Group` column is checked before the read path
/// columns so a sheet missing both reports the group column alone.
pub fn read_manifest<R: Read>(reader: R) -> Result<Vec<ManifestRow>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PipelineError::Manifest(e.to_string()))?
        .clone();

    let group_idx = column_index(&headers, GROUP_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumns(vec![GROUP_COLUMN.to_string()]))?;

    let missing: Vec<String> = [READ1_COLUMN, READ2_COLUMN]
        .iter()
        .filter(|c| column_index(&headers, c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }
    let r1_idx = column_index(&headers, READ1_COLUMN).unwrap_or_default();
    let r2_idx = column_index(&headers, READ2_COLUMN).unwrap_or_default();

    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::Manifest(format!("row {}: {}", line + 1, e)))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        let group = Some(cell(group_idx)).filter(|g| !g.trim().is_empty());
        rows.push(ManifestRow {
            group,
            read1: cell(r1_idx),
            read2: cell(r2_idx),
        });
    }
    Ok(rows)
}

/// Opens and parses the sample sheet at `path`.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestRow>, PipelineError> {
    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::Manifest(format!("cannot open {}: {}", path.display(), e)))?;
    read_manifest(file)
}

/// Splits rows into groups, keeping the order in which labels first appear.
/// Rows without a label are left out.
pub fn group_rows(rows: Vec<ManifestRow>) -> Vec<SampleGroup> {
    let mut groups: Vec<SampleGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(label) = row.group.clone() else {
            continue;
        };
        match index.get(&label) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(label.clone(), groups.len());
                groups.push(SampleGroup { label, rows: vec![row] });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Sample,Group,FASTQ Path - Read 1,FASTQ Path - Read 2\n";

    #[test]
    fn test_read_manifest_rows() -> Result<(), PipelineError> {
        let sheet = format!("{}s1,ctrl,a_R1.fq,a_R2.fq\ns2,,b_R1.fq,b_R2.fq\n", HEADER);
        let rows = read_manifest(sheet.as_bytes())?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group.as_deref(), Some("ctrl"));
        assert_eq!(rows[0].read1, "a_R1.fq");
        assert_eq!(rows[1].group, None);
        Ok(())
    }

    #[test]
    fn test_missing_group_column() {
        let sheet = "FASTQ Path - Read 1,FASTQ Path - Read 2\na,b\n";
        match read_manifest(sheet.as_bytes()) {
            Err(PipelineError::MissingColumns(cols)) => assert_eq!(cols, vec!["Group"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_path_columns_reported_together() {
        let sheet = "Group,fastq path - read 1\ng,a\n";
        match read_manifest(sheet.as_bytes()) {
            Err(PipelineError::MissingColumns(cols)) => {
                assert_eq!(cols, vec![READ1_COLUMN.to_string(), READ2_COLUMN.to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_group_rows_keeps_first_seen_order() -> Result<(), PipelineError> {
        let sheet = format!(
            "{}s1,B,1,1\ns2,A,2,2\ns3,B,3,3\ns4,,4,4\ns5,  ,5,5\ns6,A,6,6\n",
            HEADER
        );
        let groups = group_rows(read_manifest(sheet.as_bytes())?);
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A"]);
        let b: Vec<_> = groups[0].rows.iter().map(|r| r.read1.as_str()).collect();
        assert_eq!(b, vec!["1", "3"]);
        let a: Vec<_> = groups[1].rows.iter().map(|r| r.read1.as_str()).collect();
        assert_eq!(a, vec!["2", "6"]);
        Ok(())
    }

    #[test]
    fn test_short_row_yields_empty_paths() -> Result<(), PipelineError> {
        let sheet = format!("{}s1,G\n", HEADER);
        let rows = read_manifest(sheet.as_bytes())?;
        assert_eq!(rows[0].read1, "");
        assert_eq!(rows[0].read2, "");
        Ok(())
    }
}

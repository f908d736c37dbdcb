use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::defs::PipelineError;

/// (label searched for in the line, key reported)
const STAR_LOG_FIELDS: &[(&str, &str)] = &[
    ("Uniquely mapped reads %", "Uniquely mapped reads %"),
    ("Number of input reads", "Number of input reads"),
    ("Number of reads mapped to multiple loci", "Multimapped reads"),
    ("Number of reads mapped to too many loci", "Too many loci reads"),
];

/// Pulls mapping stats out of a single `Log.final.out` line, if it carries one.
fn parse_line(line: &str) -> Option<(&'static str, String)> {
    let (_, key) = STAR_LOG_FIELDS.iter().find(|(label, _)| line.contains(label))?;
    let (_, value) = line.trim().split_once('|')?;
    Some((*key, value.trim().to_string()))
}

/// Parses a STAR `Log.final.out` file into a small map of mapping stats.
///
/// A missing log yields an empty map and a warning. When a label appears on
/// more than one line the last value is kept.
///
/// # Arguments
///
/// * `log_path` - Host path of the log.
///
/// # Returns
/// Map of metric name to the value text STAR printed.
pub async fn extract_stats(log_path: &Path) -> Result<BTreeMap<String, String>, PipelineError> {
    let file = match File::open(log_path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Log file {} not found.", log_path.display());
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut stats = BTreeMap::new();
    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some((key, value)) = parse_line(&line) {
            stats.insert(key.to_string(), value);
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOG: &str = "\
                                 Started job on |\tJan 01 12:00:00
                          Number of input reads |\t1000
                      Average input read length |\t300
                   Uniquely mapped reads number |\t850
                        Uniquely mapped reads % |\t85.00%
        Number of reads mapped to multiple loci |\t0
        Number of reads mapped to too many loci |\t12
";

    #[tokio::test]
    async fn test_extract_stats() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(LOG.as_bytes())?;
        tmp.flush()?;

        let stats = extract_stats(tmp.path()).await?;
        assert_eq!(stats.len(), 4);
        assert_eq!(stats["Number of input reads"], "1000");
        assert_eq!(stats["Uniquely mapped reads %"], "85.00%");
        assert_eq!(stats["Multimapped reads"], "0");
        assert_eq!(stats["Too many loci reads"], "12");
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_stats_last_value_wins() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "Number of input reads | 10")?;
        writeln!(tmp, "Number of input reads | 20")?;
        writeln!(tmp, "Number of input reads without a pipe")?;
        tmp.flush()?;

        let stats = extract_stats(tmp.path()).await?;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["Number of input reads"], "20");
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_stats_missing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let stats = extract_stats(&dir.path().join("S1_Log.final.out")).await?;
        assert!(stats.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_line_ignores_other_labels() {
        assert_eq!(parse_line("   Average input read length |\t300"), None);
        assert_eq!(
            parse_line(" Uniquely mapped reads % | 91.2% "),
            Some(("Uniquely mapped reads %", "91.2%".to_string()))
        );
    }
}

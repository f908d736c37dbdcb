use crate::config::defs::{FASTQ_SUFFIXES, GZIP_SUFFIX, R1_LANE_TAGS, SEQUENCE_SUFFIXES};
use crate::utils::path::file_name;

/// Case-insensitive suffix strip. Returns the name without the suffix when it matches.
fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = name.split_at(split);
    if tail.eq_ignore_ascii_case(suffix) {
        Some(head)
    } else {
        None
    }
}

/// Name FastQC gives its report for a given FASTQ, minus the `_fastqc.zip` part.
/// FastQC drops the compression suffix and then one FASTQ suffix.
///
/// sample_R1_001.fastq.gz -> sample_R1_001
/// sample_R1_001.fq.gz    -> sample_R1_001
/// sample_R1_001.fastq    -> sample_R1_001
///
/// # Arguments
///
/// * `path` - FASTQ path, either separator.
///
/// # Returns
/// Basename of the expected report.
pub fn expected_report_name(path: &str) -> String {
    let mut base = file_name(path);

    if let Some(stripped) = strip_suffix_ignore_case(base, GZIP_SUFFIX) {
        base = stripped;
    }

    for suffix in FASTQ_SUFFIXES {
        if let Some(stripped) = strip_suffix_ignore_case(base, suffix) {
            base = stripped;
            break;
        }
    }

    base.to_string()
}

/// Derives the sample label from the R1 file name.
///
/// The Illumina `_R1_001` lane tag is tried first, most specific suffix first.
/// Names without one get every FASTQ suffix removed wherever it occurs.
///
/// # Arguments
///
/// * `read1` - R1 FASTQ path or file name.
///
/// # Returns
/// Sample name, used for directory and prefix naming.
pub fn derive_sample_name(read1: &str) -> String {
    let name = file_name(read1);

    for tag in R1_LANE_TAGS {
        if let Some(stripped) = name.strip_suffix(tag) {
            return stripped.to_string();
        }
    }

    SEQUENCE_SUFFIXES
        .iter()
        .fold(name.to_string(), |acc, suffix| acc.replace(suffix, ""))
}

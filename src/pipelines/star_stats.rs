use std::path::PathBuf;

use crate::config::defs::PipelineError;
use crate::utils::star_log::extract_stats;

/// Entry point for the `star_log_stats` module: prints the mapping stats of one
/// STAR log.
pub async fn run(log_path: Option<&PathBuf>) -> Result<(), PipelineError> {
    let log_path = log_path.ok_or_else(|| {
        PipelineError::InvalidConfig("--star-log is required for star_log_stats".to_string())
    })?;

    for (name, value) in extract_stats(log_path).await? {
        println!("{}: {}", name, value);
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};

use crate::config::defs::{PipelineError, RunConfig, FASTQC_OUT_DIR, MULTIQC_OUT_DIR, STAR_OUT_DIR};
use crate::utils::command::fastqc::{self, FastqcConfig};
use crate::utils::command::multiqc;
use crate::utils::command::star::{self, StarConfig};
use crate::utils::fastx::derive_sample_name;
use crate::utils::manifest::{group_rows, load_manifest, ManifestRow, SampleGroup};
use crate::utils::path::translate;
use crate::utils::runner::{ProcessRunner, SystemRunner};
use crate::utils::star_log::extract_stats;

/// What happened to one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub index: usize,
    pub label: String,
    pub artifacts: Vec<PathBuf>,
    pub aggregated: bool,
}

/// Resolves a sheet path against the base directory. Empty cells resolve to
/// nothing so the row is treated as missing its file.
fn resolve(base_dir: &Path, cell: &str) -> Option<PathBuf> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(base_dir.join(cell))
    }
}

fn unix_stamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Runs the requested tools for one sample and returns the artifacts the
/// aggregator should see.
async fn process_sample<T: ProcessRunner>(
    config: &RunConfig,
    tool_runner: &T,
    group_index: usize,
    row: &ManifestRow,
) -> Result<Vec<PathBuf>, PipelineError> {
    let options = &config.options;
    let mut artifacts = Vec::new();

    let sample_name = derive_sample_name(&row.read1);
    let (r1, r2) = match (resolve(&config.base_dir, &row.read1), resolve(&config.base_dir, &row.read2)) {
        (Some(r1), Some(r2)) if r1.exists() && r2.exists() => (r1, r2),
        _ => {
            warn!(
                "Missing files for sample {}: {} or {}",
                sample_name,
                config.base_dir.join(&row.read1).display(),
                config.base_dir.join(&row.read2).display()
            );
            return Ok(artifacts);
        }
    };

    info!("  Sample: {}", sample_name);

    let sample_out_dir = config
        .out_dir
        .join(format!("group_{}", group_index))
        .join(&sample_name);
    tokio::fs::create_dir_all(&sample_out_dir).await?;

    if options.run_quality_report {
        let fastqc_out_dir = sample_out_dir.join(FASTQC_OUT_DIR);
        let fastqc_config = FastqcConfig {
            threads: options.threads_fastqc,
            staging_root: options.fastqc_staging_root.clone(),
            stage_name: format!("fastqc_{}_{}", sample_name, unix_stamp_millis()),
        };
        let r1_wsl = translate(&r1.to_string_lossy());
        let r2_wsl = translate(&r2.to_string_lossy());
        fastqc::run(tool_runner, &fastqc_config, &r1_wsl, &r2_wsl, &fastqc_out_dir).await?;

        // Added whether or not FastQC succeeded; the check below only warns.
        artifacts.push(fastqc_out_dir.clone());

        for expected in fastqc::expected_reports(&r1, &r2, &fastqc_out_dir) {
            if !expected.exists() {
                warn!("  Expected FastQC output not found: {}", expected.display());
            }
        }
    }

    if options.run_alignment {
        let star_config = StarConfig {
            threads: options.threads_star,
            index: options.star_index.clone(),
        };
        let align_out_dir = sample_out_dir.join(STAR_OUT_DIR);
        let log_file = star::run(tool_runner, &star_config, &r1, &r2, &align_out_dir, &sample_name).await?;

        if log_file.exists() {
            match extract_stats(&log_file).await {
                Ok(stats) => {
                    for (name, value) in stats {
                        info!("  {} {}: {}", sample_name, name, value);
                    }
                }
                Err(e) => warn!("  Could not read STAR stats from {}: {}", log_file.display(), e),
            }
            artifacts.push(log_file);
        } else {
            warn!("  STAR log not found: {}", log_file.display());
        }
    }

    Ok(artifacts)
}

/// Processes one group and aggregates whatever artifacts it produced.
async fn process_group<T: ProcessRunner, A: ProcessRunner>(
    config: &RunConfig,
    tool_runner: &T,
    aggregator_runner: &A,
    index: usize,
    group: &SampleGroup,
) -> Result<GroupReport, PipelineError> {
    info!("Processing group {} ({}) with {} samples:", index, group.label, group.rows.len());

    let mut artifacts = Vec::new();
    for row in &group.rows {
        artifacts.extend(process_sample(config, tool_runner, index, row).await?);
    }

    if artifacts.is_empty() {
        info!("No files to analyze for group {}. Skipping MultiQC.", index);
        return Ok(GroupReport { index, label: group.label.clone(), artifacts, aggregated: false });
    }

    let multiqc_out_dir = config
        .out_dir
        .join(format!("group_{}_{}", index, group.label))
        .join(MULTIQC_OUT_DIR);
    multiqc::run(aggregator_runner, &artifacts, &multiqc_out_dir).await?;

    Ok(GroupReport { index, label: group.label.clone(), artifacts, aggregated: true })
}

/// Runs QC (FastQC), alignment (STAR) and aggregation (MultiQC) for every group
/// in the sample sheet.
///
/// Tools that exit non-zero are logged and the batch moves on. Configuration
/// problems and unreadable sheets stop the run before any tool is launched.
///
/// # Arguments
///
/// * `config` - Run configuration.
/// * `tool_runner` - Runner for the Linux-side tools (FastQC, STAR).
/// * `aggregator_runner` - Runner for MultiQC.
///
/// # Returns
/// One report per group, in sheet order.
pub async fn process_groups<T: ProcessRunner, A: ProcessRunner>(
    config: &RunConfig,
    tool_runner: &T,
    aggregator_runner: &A,
) -> Result<Vec<GroupReport>, PipelineError> {
    config.validate()?;

    let rows = load_manifest(&config.manifest_path())?;
    let groups = group_rows(rows);
    info!("Found {} groups in {}", groups.len(), config.manifest_path().display());

    let mut reports = Vec::with_capacity(groups.len());
    for (i, group) in groups.iter().enumerate() {
        reports.push(process_group(config, tool_runner, aggregator_runner, i + 1, group).await?);
    }
    Ok(reports)
}

/// Entry point for the `group_qc` module. MultiQC always runs on the host.
pub async fn run(config: &RunConfig, tool_runner: &SystemRunner) -> Result<(), PipelineError> {
    println!("\n-------------\n Group QC\n-------------\n");

    let reports = process_groups(config, tool_runner, &SystemRunner::Native).await?;
    let aggregated = reports.iter().filter(|r| r.aggregated).count();
    info!("{} of {} groups aggregated", aggregated, reports.len());
    Ok(())
}

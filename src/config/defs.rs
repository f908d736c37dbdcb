use std::path::PathBuf;
use thiserror::Error;

// External software
pub const STAR_TAG: &str = "STAR";
pub const FASTQC_TAG: &str = "fastqc";
pub const MULTIQC_TAG: &str = "multiqc";
pub const MKDIR_TAG: &str = "mkdir";
pub const CP_TAG: &str = "cp";

// Manifest columns
pub const GROUP_COLUMN: &str = "Group";
pub const READ1_COLUMN: &str = "FASTQ Path - Read 1";
pub const READ2_COLUMN: &str = "FASTQ Path - Read 2";

// Filename conventions
pub const GZIP_SUFFIX: &str = ".gz";
pub const FASTQ_SUFFIXES: &[&str] = &[".fastq", ".fq"];
pub const R1_LANE_TAGS: &[&str] = &["_R1_001.fastq.gz", "_R1_001.fq.gz", "_R1_001.fastq", "_R1_001.fq"];
pub const SEQUENCE_SUFFIXES: &[&str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];
pub const FASTQC_REPORT_SUFFIX: &str = "_fastqc.zip";
pub const STAR_LOG_SUFFIX: &str = "Log.final.out";

// Output layout
pub const FASTQC_OUT_DIR: &str = "fastqc_output";
pub const STAR_OUT_DIR: &str = "star_alignment";
pub const MULTIQC_OUT_DIR: &str = "multiqc_report";

// Static Parameters
pub const STAR_READ_FILES_COMMAND: &str = "zcat";
pub const STAR_MULTIMAP_NMAX: usize = 1;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Manifest is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Tool {tool} failed: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("I/O error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}

/// How the Linux-side tools get launched from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub launcher: String,
    pub shell: String,
    pub workdir: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            launcher: "wsl".to_string(),
            shell: "bash".to_string(),
            workdir: "/tmp".to_string(),
        }
    }
}

/// What the group orchestrator should run for each sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOptions {
    pub run_alignment: bool,
    pub run_quality_report: bool,
    pub threads_fastqc: usize,
    pub threads_star: usize,
    pub star_index: Option<PathBuf>,
    pub fastqc_staging_root: Option<String>,
}

impl Default for GroupOptions {
    fn default() -> Self {
        GroupOptions {
            run_alignment: false,
            run_quality_report: false,
            threads_fastqc: 2,
            threads_star: 4,
            star_index: None,
            fastqc_staging_root: None,
        }
    }
}

pub struct RunConfig {
    pub base_dir: PathBuf,
    pub manifest: PathBuf,
    pub out_dir: PathBuf,
    pub options: GroupOptions,
}

impl RunConfig {
    /// Manifest location, resolved against the base directory when relative.
    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(&self.manifest)
    }

    /// Fails on settings that would make the run abort halfway through.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.options.run_alignment && self.options.star_index.is_none() {
            return Err(PipelineError::InvalidConfig(
                "star_index must be provided when alignment is requested".to_string(),
            ));
        }
        if self.options.threads_fastqc == 0 || self.options.threads_star == 0 {
            return Err(PipelineError::InvalidConfig(
                "thread counts must be at least 1".to_string(),
            ));
        }
        if let Some(root) = &self.options.fastqc_staging_root {
            if !(root.starts_with('/') || root.starts_with("~/")) {
                return Err(PipelineError::InvalidConfig(format!(
                    "fastqc staging root must be absolute or start with ~/: {}",
                    root
                )));
            }
        }
        Ok(())
    }
}

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, ValueEnum, Default, PartialEq)]
pub enum RunnerKind {
    Native,
    #[default]
    Wsl,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "groupqc-pipelines", version, about = "Per-group FastQC, STAR and MultiQC runs driven by a sample sheet")]
pub struct Arguments {

    #[arg(short, long, default_value = "group_qc", help = "group_qc or star_log_stats")]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'b', long = "base-dir", default_value = ".", help = "Directory the sample sheet paths are relative to")]
    pub base_dir: String,

    #[arg(short = 'c', long = "manifest", default_value = "samples.csv", help = "Sample sheet with Group, 'FASTQ Path - Read 1' and 'FASTQ Path - Read 2' columns")]
    pub manifest: String,

    #[arg(short = 'o', long = "out", help = "Output directory. Defaults to '<base-dir>/pipeline_output'.")]
    pub out_dir: Option<String>,

    #[arg(long = "star-index", help = "STAR genome index directory, host path")]
    pub star_index: Option<String>,

    #[arg(long = "run-alignment", default_value_t = false)]
    pub run_alignment: bool,

    #[arg(long = "run-fastqc", default_value_t = false)]
    pub run_fastqc: bool,

    #[arg(long, default_value_t = 2)]
    pub threads_fastqc: usize,

    #[arg(long, default_value_t = 4)]
    pub threads_star: usize,

    #[arg(long = "runner", default_value = "wsl", value_enum, help = "How FastQC and STAR are launched")]
    pub runner: RunnerKind,

    #[arg(long, default_value = "wsl")]
    pub bridge_launcher: String,

    #[arg(long, default_value = "bash")]
    pub bridge_shell: String,

    #[arg(long, default_value = "/tmp", help = "Working directory inside the subsystem before tools start")]
    pub bridge_workdir: String,

    #[arg(long, help = "Subsystem directory (absolute or ~/...) FastQC writes to before results are copied to the host")]
    pub fastqc_staging_root: Option<String>,

    #[arg(long = "star-log", help = "Log.final.out to summarise (star_log_stats)")]
    pub star_log: Option<String>,
}

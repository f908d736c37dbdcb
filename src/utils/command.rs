//! Functions and structs for building tool command lines and invoking the tools

use log::{error, info};
use crate::utils::runner::{ToolCall, ToolOutput};


pub mod fastqc {
    use std::path::{Path, PathBuf};
    use log::info;
    use crate::config::defs::{PipelineError, CP_TAG, FASTQC_REPORT_SUFFIX, FASTQC_TAG, MKDIR_TAG};
    use crate::utils::fastx::expected_report_name;
    use crate::utils::path::{posix_join, translate};
    use crate::utils::runner::{ProcessRunner, ToolCall};
    use super::report_outcome;

    #[derive(Debug, Clone)]
    pub struct FastqcConfig {
        pub threads: usize,
        /// Subsystem-side directory to write into before copying to the host.
        pub staging_root: Option<String>,
        /// Directory under `staging_root` used for this sample only.
        pub stage_name: String,
    }

    pub fn arg_generator(config: &FastqcConfig, r1: &str, r2: &str, out_dir: &str) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-t".to_string());
        args_vec.push(config.threads.to_string());
        args_vec.push(r1.to_string());
        args_vec.push(r2.to_string());
        args_vec.push("-o".to_string());
        args_vec.push(out_dir.to_string());
        args_vec
    }

    /// The calls making up one FastQC run. With a staging root the reports are
    /// written there first and then copied into the host directory.
    pub fn calls(config: &FastqcConfig, r1_wsl: &str, r2_wsl: &str, out_dir_wsl: &str) -> Vec<ToolCall> {
        match &config.staging_root {
            Some(root) => {
                let stage = posix_join(root, &config.stage_name);
                vec![
                    ToolCall::new(MKDIR_TAG, vec!["-p".to_string(), stage.clone()]),
                    ToolCall::new(FASTQC_TAG, arg_generator(config, r1_wsl, r2_wsl, &stage)),
                    ToolCall::new(CP_TAG, vec!["-a".to_string(), format!("{}/.", stage), out_dir_wsl.to_string()]),
                ]
            }
            None => vec![ToolCall::new(FASTQC_TAG, arg_generator(config, r1_wsl, r2_wsl, out_dir_wsl))],
        }
    }

    /// Report files FastQC should leave in `out_dir` for a read pair.
    pub fn expected_reports(r1: &Path, r2: &Path, out_dir: &Path) -> [PathBuf; 2] {
        [r1, r2].map(|read| {
            let base = expected_report_name(&read.to_string_lossy());
            out_dir.join(format!("{}{}", base, FASTQC_REPORT_SUFFIX))
        })
    }

    /// Runs FastQC on an already translated read pair, writing into the host
    /// directory `out_dir`. Returns whether the tool reported success.
    pub async fn run<R: ProcessRunner>(
        runner: &R,
        config: &FastqcConfig,
        r1_wsl: &str,
        r2_wsl: &str,
        out_dir: &Path,
    ) -> Result<bool, PipelineError> {
        tokio::fs::create_dir_all(out_dir).await?;
        let out_dir_wsl = translate(&out_dir.to_string_lossy());
        let calls = calls(config, r1_wsl, r2_wsl, &out_dir_wsl);

        info!("Running FastQC on {} and {}", r1_wsl, r2_wsl);
        let output = runner.run(&calls).await?;
        Ok(report_outcome(FASTQC_TAG, &calls, &output, &format!("FastQC reports written to {}", out_dir.display())))
    }
}

pub mod star {
    use std::path::{Path, PathBuf};
    use log::info;
    use crate::config::defs::{PipelineError, STAR_LOG_SUFFIX, STAR_MULTIMAP_NMAX, STAR_READ_FILES_COMMAND, STAR_TAG};
    use crate::utils::path::{posix_join, translate};
    use crate::utils::runner::{ProcessRunner, ToolCall};
    use super::report_outcome;

    #[derive(Debug, Clone)]
    pub struct StarConfig {
        pub threads: usize,
        pub index: Option<PathBuf>,
    }

    pub fn arg_generator(threads: usize, index_wsl: &str, r1_wsl: &str, r2_wsl: &str, out_prefix_wsl: &str) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--runThreadN".to_string());
        args_vec.push(threads.to_string());
        args_vec.push("--genomeDir".to_string());
        args_vec.push(index_wsl.to_string());
        args_vec.push("--readFilesIn".to_string());
        args_vec.push(r1_wsl.to_string());
        args_vec.push(r2_wsl.to_string());
        args_vec.push("--readFilesCommand".to_string());
        args_vec.push(STAR_READ_FILES_COMMAND.to_string());
        args_vec.push("--outFileNamePrefix".to_string());
        args_vec.push(out_prefix_wsl.to_string());
        args_vec.push("--outSAMtype".to_string());
        args_vec.push("BAM".to_string());
        args_vec.push("SortedByCoordinate".to_string());
        args_vec.push("--outSAMunmapped".to_string());
        args_vec.push("Within".to_string());
        args_vec.push("--outFilterMultimapNmax".to_string());
        args_vec.push(STAR_MULTIMAP_NMAX.to_string());
        args_vec.push("--outReadsUnmapped".to_string());
        args_vec.push("Fastx".to_string());
        args_vec
    }

    /// Host path of the final log STAR writes for `sample_name` under `out_dir`.
    pub fn log_path(out_dir: &Path, sample_name: &str) -> PathBuf {
        out_dir.join(format!("{}_{}", sample_name, STAR_LOG_SUFFIX))
    }

    /// Aligns a paired-end sample. Takes host paths and translates them itself.
    ///
    /// # Returns
    /// Host path of the `Log.final.out` the run should have produced. The file
    /// may not exist if the alignment failed.
    pub async fn run<R: ProcessRunner>(
        runner: &R,
        config: &StarConfig,
        r1: &Path,
        r2: &Path,
        out_dir: &Path,
        sample_name: &str,
    ) -> Result<PathBuf, PipelineError> {
        let index = config.index.as_ref().ok_or_else(|| {
            PipelineError::InvalidConfig("star_index must be provided when alignment is requested".to_string())
        })?;

        tokio::fs::create_dir_all(out_dir).await?;

        let r1_wsl = translate(&r1.to_string_lossy());
        let r2_wsl = translate(&r2.to_string_lossy());
        let index_wsl = translate(&index.to_string_lossy());
        let out_prefix_wsl = posix_join(&translate(&out_dir.to_string_lossy()), &format!("{}_", sample_name));

        let calls = vec![ToolCall::new(
            STAR_TAG,
            arg_generator(config.threads, &index_wsl, &r1_wsl, &r2_wsl, &out_prefix_wsl),
        )];

        info!("Running STAR alignment for {}...", sample_name);
        let output = runner.run(&calls).await?;
        report_outcome(STAR_TAG, &calls, &output, &format!("STAR alignment completed for {}.", sample_name));

        Ok(log_path(out_dir, sample_name))
    }
}

pub mod multiqc {
    use std::path::{Path, PathBuf};
    use log::info;
    use crate::config::defs::{PipelineError, MULTIQC_TAG};
    use crate::utils::runner::{ProcessRunner, ToolCall};
    use super::report_outcome;

    pub fn arg_generator(out_dir: &Path, inputs: &[PathBuf]) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-v".to_string());
        args_vec.push("-o".to_string());
        args_vec.push(out_dir.to_string_lossy().to_string());
        args_vec.extend(inputs.iter().map(|p| p.to_string_lossy().to_string()));
        args_vec
    }

    /// Aggregates `inputs` into one report under `out_dir`. Existing contents of
    /// `out_dir` are left in place.
    pub async fn run<R: ProcessRunner>(
        runner: &R,
        inputs: &[PathBuf],
        out_dir: &Path,
    ) -> Result<bool, PipelineError> {
        tokio::fs::create_dir_all(out_dir).await?;
        let calls = vec![ToolCall::new(MULTIQC_TAG, arg_generator(out_dir, inputs))];

        info!("Running MultiQC on {} inputs", inputs.len());
        let output = runner.run(&calls).await?;
        Ok(report_outcome(MULTIQC_TAG, &calls, &output, &format!("MultiQC report generated in {}", out_dir.display())))
    }
}


/// Logs the outcome of a tool run. Failures are reported with the command
/// line and both output streams but never turned into errors.
fn report_outcome(tool: &str, calls: &[ToolCall], output: &ToolOutput, success_msg: &str) -> bool {
    if output.success() {
        info!("{}", success_msg);
        return true;
    }

    let status = output
        .status
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    error!("{} exited with status {}", tool, status);
    for call in calls {
        error!("{} command:\n  {}", tool, call.display());
    }
    error!("{} stderr:\n{}", tool, output.stderr.trim());
    error!("{} stdout:\n{}", tool, output.stdout.trim());
    false
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use crate::config::defs::PipelineError;
    use crate::utils::runner::ProcessRunner;

    struct FixedRunner {
        status: i32,
        seen: Mutex<Vec<ToolCall>>,
    }

    impl FixedRunner {
        fn new(status: i32) -> Self {
            FixedRunner { status, seen: Mutex::new(Vec::new()) }
        }
    }

    impl ProcessRunner for FixedRunner {
        async fn run(&self, calls: &[ToolCall]) -> Result<ToolOutput, PipelineError> {
            self.seen.lock().unwrap().extend_from_slice(calls);
            Ok(ToolOutput { status: Some(self.status), stdout: "out".into(), stderr: "err".into() })
        }
    }

    fn fastqc_config(staging_root: Option<&str>) -> fastqc::FastqcConfig {
        fastqc::FastqcConfig { threads: 4, staging_root: staging_root.map(String::from), stage_name: "fastqc_S1_1700000000123".to_string() }
    }

    #[test]
    fn test_fastqc_args() {
        let args = fastqc::arg_generator(&fastqc_config(None), "/mnt/d/r1.fq.gz", "/mnt/d/r2.fq.gz", "/mnt/d/out");
        assert_eq!(args, vec!["-t", "4", "/mnt/d/r1.fq.gz", "/mnt/d/r2.fq.gz", "-o", "/mnt/d/out"]);
    }

    #[test]
    fn test_fastqc_staged_calls() {
        let calls = fastqc::calls(&fastqc_config(Some("/home/me/fastqc_runs")), "/r1.fq", "/r2.fq", "/mnt/d/out");
        let stage = "/home/me/fastqc_runs/fastqc_S1_1700000000123";
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].display(), format!("mkdir -p {}", stage));
        assert_eq!(calls[1].args.last().map(String::as_str), Some(stage));
        assert_eq!(calls[2].display(), format!("cp -a {}/. /mnt/d/out", stage));
    }

    #[test]
    fn test_fastqc_expected_reports() {
        let [a, b] = fastqc::expected_reports(
            Path::new("/in/S1_R1_001.fastq.gz"),
            Path::new("/in/S1_R2_001.fastq.gz"),
            Path::new("/out"),
        );
        assert_eq!(a, PathBuf::from("/out/S1_R1_001_fastqc.zip"));
        assert_eq!(b, PathBuf::from("/out/S1_R2_001_fastqc.zip"));
    }

    #[test]
    fn test_star_args() {
        let args = star::arg_generator(8, "/mnt/d/idx", "/mnt/d/r1.fq.gz", "/mnt/d/r2.fq.gz", "/mnt/d/out/S1_");
        assert_eq!(
            args.join(" "),
            "--runThreadN 8 --genomeDir /mnt/d/idx --readFilesIn /mnt/d/r1.fq.gz /mnt/d/r2.fq.gz \
             --readFilesCommand zcat --outFileNamePrefix /mnt/d/out/S1_ --outSAMtype BAM SortedByCoordinate \
             --outSAMunmapped Within --outFilterMultimapNmax 1 --outReadsUnmapped Fastx"
        );
    }

    #[test]
    fn test_multiqc_args_split_flags() {
        let args = multiqc::arg_generator(Path::new("/out/g1"), &[PathBuf::from("/a"), PathBuf::from("/b/log")]);
        assert_eq!(args, vec!["-v", "-o", "/out/g1", "/a", "/b/log"]);
    }

    #[tokio::test]
    async fn test_star_run_creates_dir_and_returns_log_path() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let out_dir = tmp.path().join("star_alignment");
        let runner = FixedRunner::new(0);
        let config = star::StarConfig { threads: 2, index: Some(PathBuf::from("/idx")) };

        let log = star::run(&runner, &config, Path::new("/in/r1.fq"), Path::new("/in/r2.fq"), &out_dir, "S1").await?;

        assert!(out_dir.is_dir());
        assert_eq!(log, out_dir.join("S1_Log.final.out"));
        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, "STAR");
        let prefix = format!("{}/S1_", out_dir.display());
        assert!(seen[0].args.contains(&prefix));
        Ok(())
    }

    #[tokio::test]
    async fn test_star_run_without_index_fails() {
        let runner = FixedRunner::new(0);
        let config = star::StarConfig { threads: 2, index: None };
        let res = star::run(&runner, &config, Path::new("/r1"), Path::new("/r2"), Path::new("/unused"), "S1").await;
        assert!(matches!(res, Err(PipelineError::InvalidConfig(_))));
        assert!(runner.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_tool_is_not_an_error() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let runner = FixedRunner::new(1);
        let ok = multiqc::run(&runner, &[PathBuf::from("/a")], &tmp.path().join("report")).await?;
        assert!(!ok);

        let ok = fastqc::run(&runner, &fastqc_config(None), "/r1", "/r2", &tmp.path().join("qc")).await?;
        assert!(!ok);
        Ok(())
    }
}

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use log::{LevelFilter, error, info};
use env_logger::Builder;
use groupqc_pipelines::cli::parse;
use groupqc_pipelines::cli::args::{Arguments, RunnerKind};
use groupqc_pipelines::config::defs::{BridgeConfig, GroupOptions, PipelineError, RunConfig};
use groupqc_pipelines::utils::runner::SystemRunner;
use groupqc_pipelines::pipelines::{group_qc, star_stats};


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n GroupQC\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}\n", dir);

    let module = args.module.clone();
    if let Err(e) = match module.as_str() {
        "group_qc" => group_qc_run(&args, &dir).await,
        "star_log_stats" => star_stats::run(args.star_log.as_ref().map(PathBuf::from).as_ref()).await,
        _ => Err(PipelineError::InvalidConfig(format!("Invalid module: {}", module))),
    } {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


async fn group_qc_run(args: &Arguments, cwd: &Path) -> Result<(), PipelineError> {
    let run_config = build_run_config(args, cwd);
    let runner = tool_runner(args);
    group_qc::run(&run_config, &runner).await
}

/// Builds the run configuration from the command line.
/// Relative base and output directories are taken from `cwd`; the output
/// directory defaults to `<base_dir>/pipeline_output`.
fn build_run_config(args: &Arguments, cwd: &Path) -> RunConfig {
    let base_dir = cwd.join(&args.base_dir);
    let out_dir = match &args.out_dir {
        Some(out) => cwd.join(out),
        None => base_dir.join("pipeline_output"),
    };

    RunConfig {
        manifest: PathBuf::from(&args.manifest),
        out_dir,
        options: GroupOptions {
            run_alignment: args.run_alignment,
            run_quality_report: args.run_fastqc,
            threads_fastqc: args.threads_fastqc,
            threads_star: args.threads_star,
            star_index: args.star_index.as_ref().map(PathBuf::from),
            fastqc_staging_root: args.fastqc_staging_root.clone(),
        },
        base_dir,
    }
}

fn tool_runner(args: &Arguments) -> SystemRunner {
    match args.runner {
        RunnerKind::Native => SystemRunner::Native,
        RunnerKind::Wsl => SystemRunner::Bridged(BridgeConfig {
            launcher: args.bridge_launcher.clone(),
            shell: args.bridge_shell.clone(),
            workdir: args.bridge_workdir.clone(),
        }),
    }
}

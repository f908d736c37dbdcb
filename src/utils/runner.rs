// src/utils/runner.rs: launching external tools natively or through the WSL bridge
use std::borrow::Cow;
use std::process::Stdio;

use log::debug;
use shell_escape::unix::escape;
use tokio::process::Command;

use crate::config::defs::{BridgeConfig, PipelineError};

/// One external command: program plus its argument words.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCall {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        ToolCall { program: program.to_string(), args }
    }

    /// Space-joined command line, for diagnostics only.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn shell_words(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|w| shell_word(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Escapes one word for the bridge shell. A leading `~/` stays unquoted so
/// the shell still expands it to the home directory.
fn shell_word(word: &str) -> String {
    match word.strip_prefix("~/") {
        Some(rest) if !rest.is_empty() => format!("~/{}", escape(Cow::from(rest))),
        Some(_) => "~/".to_string(),
        None => escape(Cow::from(word)).into_owned(),
    }
}

/// Exit status and captured text of a finished unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Executes a sequence of calls as one unit, stopping at the first failure.
///
/// Returns `Err` only when a process cannot be started at all. A process
/// exiting non-zero is reported through `ToolOutput::status`.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
    async fn run(&self, calls: &[ToolCall]) -> Result<ToolOutput, PipelineError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SystemRunner {
    Native,
    Bridged(BridgeConfig),
}

impl SystemRunner {
    /// Builds the bridged command: `<launcher> -e <shell> -lc <script>`.
    pub fn bridge_call(bridge: &BridgeConfig, calls: &[ToolCall]) -> ToolCall {
        ToolCall::new(
            &bridge.launcher,
            vec![
                "-e".to_string(),
                bridge.shell.clone(),
                "-lc".to_string(),
                bridge_script(bridge, calls),
            ],
        )
    }
}

/// Shell script run inside the subsystem. Changes directory first so the
/// tools never start inside a host-mounted tree.
pub fn bridge_script(bridge: &BridgeConfig, calls: &[ToolCall]) -> String {
    let mut parts = vec![
        "set -euo pipefail".to_string(),
        format!("cd {}", escape(Cow::from(bridge.workdir.as_str()))),
    ];
    parts.extend(calls.iter().map(ToolCall::shell_words));
    parts.join("; ")
}

async fn spawn_and_wait(call: &ToolCall) -> Result<ToolOutput, PipelineError> {
    debug!("Executing: {}", call.display());
    let output = Command::new(&call.program)
        .args(&call.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::ToolExecution {
            tool: call.program.clone(),
            error: format!("failed to spawn: {}. Is {} installed?", e, call.program),
        })?;

    Ok(ToolOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

impl ProcessRunner for SystemRunner {
    async fn run(&self, calls: &[ToolCall]) -> Result<ToolOutput, PipelineError> {
        match self {
            SystemRunner::Native => {
                let mut combined = ToolOutput { status: Some(0), ..Default::default() };
                for call in calls {
                    let out = spawn_and_wait(call).await?;
                    combined.stdout.push_str(&out.stdout);
                    combined.stderr.push_str(&out.stderr);
                    combined.status = out.status;
                    if !out.success() {
                        break;
                    }
                }
                Ok(combined)
            }
            SystemRunner::Bridged(bridge) => {
                spawn_and_wait(&SystemRunner::bridge_call(bridge, calls)).await
            }
        }
    }
}

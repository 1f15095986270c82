// Subprocess runner - executes validator commands as child processes
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::{PipeReader, Read, Write};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use fencecheck_core::domain::{Outcome, RunError};
use fencecheck_core::port::{ProcessRunner, TimeProvider};

use crate::command_line::CommandLine;

/// Prefix for per-invocation input files
const TEMP_FILE_PREFIX: &str = "fencecheck-";

/// Exit status plus stdout and stderr exactly as the process wrote them
struct CapturedOutput {
    status: ExitStatus,
    output: Vec<u8>,
}

/// Subprocess runner
///
/// Input reaches the validator on stdin, or through a fresh temp file when
/// the command contains the `$<` placeholder.
pub struct SubprocessRunner {
    time_provider: Arc<dyn TimeProvider>,
    temp_dir: Option<PathBuf>,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new(Arc::new(SystemTimeProvider));
    /// let outcome = runner.run("echo hi", "sh -n").await;
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            temp_dir: None,
        }
    }

    /// Create input files in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Feed `input` on stdin, then close it
    async fn run_with_stdin(
        &self,
        command: &CommandLine,
        input: Vec<u8>,
    ) -> Result<CapturedOutput, RunError> {
        debug!(argv = ?command.argv(), "Spawning validator (stdin)");

        let mut cmd = Command::new(command.program());
        cmd.args(&command.argv()[1..]).stdin(Stdio::piped());
        let (mut child, output) = spawn(cmd)?;

        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // Validators may exit without reading everything (grep -q)
                match stdin.write_all(&input).await {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => debug!(error = %e, "Failed to write validator stdin"),
                    Ok(()) => {}
                }
                // stdin dropped here: EOF for the child
            }
        });

        let captured = capture_merged(child, output).await;
        let _ = writer.await;
        captured
    }

    /// Write `input` to a unique temp file and substitute its path
    async fn run_with_input_file(
        &self,
        command: &CommandLine,
        input: &[u8],
    ) -> Result<CapturedOutput, RunError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_FILE_PREFIX);
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| RunError::TempFile(e.to_string()))?;

        file.write_all(input)
            .and_then(|_| file.flush())
            .map_err(|e| RunError::TempFile(e.to_string()))?;

        // Closes our handle; the path is removed on drop if we bail early
        let path = file.into_temp_path();

        let program = command.program_with_input_file(&path);
        let args: Vec<OsString> = command.args_with_input_file(&path);
        debug!(program = ?program, args = ?args, "Spawning validator (input file)");

        let mut cmd = Command::new(&program);
        cmd.args(&args).stdin(Stdio::null());
        let result = match spawn(cmd) {
            Ok((child, output)) => capture_merged(child, output).await,
            Err(e) => Err(e),
        };

        // Cleanup failure is not fatal
        if let Err(e) = path.close() {
            debug!(error = %e, "Failed to remove validator input file");
        }
        result
    }

    /// Map process result to outcome
    fn build_outcome(captured: CapturedOutput) -> Outcome {
        if captured.status.success() {
            Outcome::Success
        } else {
            Outcome::Failure {
                output: String::from_utf8_lossy(&captured.output).into_owned(),
                exit_code: captured.status.code(),
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for SubprocessRunner {
    async fn run(&self, content: &str, command_line: &str) -> Outcome {
        let command = match CommandLine::parse(command_line) {
            Ok(command) => command,
            Err(e) => return Outcome::RunError(e),
        };

        let mut input = content.as_bytes().to_vec();
        input.push(b'\n');

        let start_time = self.time_provider.now_millis();
        let captured = if command.uses_input_file() {
            self.run_with_input_file(&command, &input).await
        } else {
            self.run_with_stdin(&command, input).await
        };
        let duration_ms = self.time_provider.elapsed_millis(start_time);

        match captured {
            Ok(captured) => {
                info!(
                    command = %command_line,
                    duration_ms = %duration_ms,
                    exit_code = ?captured.status.code(),
                    "Validator finished"
                );
                Self::build_outcome(captured)
            }
            Err(e) => {
                info!(
                    command = %command_line,
                    duration_ms = %duration_ms,
                    error = %e,
                    "Validator could not run"
                );
                Outcome::RunError(e)
            }
        }
    }
}

/// Spawn with stdout and stderr sharing the write end of one pipe
fn spawn(mut command: Command) -> Result<(Child, PipeReader), RunError> {
    let (reader, writer) = std::io::pipe().map_err(|e| RunError::Spawn(e.to_string()))?;
    let writer_err = writer
        .try_clone()
        .map_err(|e| RunError::Spawn(e.to_string()))?;

    let child = command
        .stdout(writer)
        .stderr(writer_err)
        .spawn()
        .map_err(|e| RunError::Spawn(e.to_string()))?;

    // The command owns our copies of the write end; EOF needs them closed
    drop(command);
    Ok((child, reader))
}

/// Read the merged stream until every writer is gone, then reap the child
async fn capture_merged(
    mut child: Child,
    mut reader: PipeReader,
) -> Result<CapturedOutput, RunError> {
    let output = tokio::task::spawn_blocking(move || {
        let mut output = Vec::new();
        reader.read_to_end(&mut output).map(|_| output)
    })
    .await
    .map_err(|e| RunError::Io(e.to_string()))?
    .map_err(|e| RunError::Io(e.to_string()))?;

    let status = child
        .wait()
        .await
        .map_err(|e| RunError::Io(e.to_string()))?;
    Ok(CapturedOutput { status, output })
}

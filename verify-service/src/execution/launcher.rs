// Job Launchers
// Runs a test unit's artifact through the backend verification tool

use crate::config::ToolConfig;
use crate::execution::job::{JobOutcome, LaunchError};
use crate::generator::TestUnit;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long to keep draining output after the process itself exited
const OUTPUT_GRACE: Duration = Duration::from_secs(5);

/// Something that can run one verification job to an outcome
#[async_trait::async_trait]
pub trait JobLauncher: Send + Sync {
    /// Run the unit, giving up after `timeout`
    async fn launch(&self, unit: &TestUnit, timeout: Duration) -> JobOutcome;
}

/// Launches the backend tool as an external process
///
/// The command line is `<program> [args...] <artifact>`, run from the
/// artifact's directory with stdout and stderr captured. On unix the
/// backend leads its own process group, so a timeout also stops the
/// solvers it spawned.
pub struct ProcessLauncher {
    program: String,
    resolved: Result<PathBuf, String>,
    args: Vec<String>,
    output_grace: Duration,
}

impl ProcessLauncher {
    /// Resolve the configured program once; a missing tool fails every launch
    pub fn new(tool: &ToolConfig) -> Self {
        let resolved = which::which(&tool.program).map_err(|e| e.to_string());
        match &resolved {
            Ok(path) => tracing::debug!(program = %tool.program, path = %path.display(), "resolved backend tool"),
            Err(e) => tracing::warn!(program = %tool.program, error = %e, "backend tool not found"),
        }

        Self {
            program: tool.program.clone(),
            resolved,
            args: tool.args.clone(),
            output_grace: OUTPUT_GRACE,
        }
    }

    /// Set how long output is drained after the backend exits
    pub fn with_output_grace(mut self, grace: Duration) -> Self {
        self.output_grace = grace;
        self
    }

    /// Resolved program path, if the tool was found
    pub fn program_path(&self) -> Option<&PathBuf> {
        self.resolved.as_ref().ok()
    }

    /// Artifact argument as seen from the artifact's own directory
    fn artifact_arg(unit: &TestUnit) -> OsString {
        if unit.artifact_path.is_absolute() {
            return unit.artifact_path.clone().into_os_string();
        }
        unit.artifact_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| unit.artifact_path.clone().into_os_string())
    }
}

#[async_trait::async_trait]
impl JobLauncher for ProcessLauncher {
    async fn launch(&self, unit: &TestUnit, timeout: Duration) -> JobOutcome {
        let program = match &self.resolved {
            Ok(path) => path,
            Err(reason) => {
                return JobOutcome::LaunchFailed(LaunchError::ProgramNotFound {
                    program: self.program.clone(),
                    reason: reason.clone(),
                })
            }
        };

        let mut cmd = Command::new(program);
        cmd.args(&self.args);
        cmd.arg(Self::artifact_arg(unit));
        cmd.current_dir(unit.artifact_dir());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let started = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                return JobOutcome::LaunchFailed(LaunchError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
        };

        let pid = child.id();
        tracing::debug!(job = %unit.name, pid = ?pid, "launched");

        // Drain both pipes concurrently so a chatty backend never blocks on a full pipe
        let mut stdout = OutputReader::spawn(child.stdout.take());
        let mut stderr = OutputReader::spawn(child.stderr.take());

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let elapsed = started.elapsed();
                let drained = drain(&mut stdout, &mut stderr, self.output_grace).await;
                if !drained {
                    // Leftover descendants still hold the pipes
                    tracing::warn!(job = %unit.name, "backend exited but its output stayed open, stopping leftovers");
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                }
                let stdout = stdout.finish();
                let stderr = stderr.finish();

                match status.code() {
                    Some(code) => JobOutcome::Exited {
                        code,
                        stdout,
                        stderr,
                        elapsed: Some(elapsed),
                    },
                    None => JobOutcome::LaunchFailed(LaunchError::Terminated(status.to_string())),
                }
            }
            Ok(Err(e)) => {
                stdout.finish();
                stderr.finish();
                JobOutcome::LaunchFailed(LaunchError::Wait(e))
            }
            Err(_) => {
                tracing::warn!(job = %unit.name, timeout_secs = timeout.as_secs(), "timed out, killing");
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    tracing::warn!(job = %unit.name, error = %e, "failed to kill timed out job");
                }
                let terminated = matches!(child.try_wait(), Ok(Some(_)));
                stdout.finish();
                stderr.finish();
                JobOutcome::TimedOut {
                    after: timeout,
                    terminated,
                }
            }
        }
    }
}

/// A pipe drained by a background task into a buffer the launcher keeps
struct OutputReader {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl OutputReader {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });
        Self { buffer, handle }
    }

    /// Stop reading and return everything read so far
    fn finish(&self) -> String {
        self.handle.abort();
        match self.buffer.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

/// Wait for both pipes to close, up to `grace`; true when both closed
async fn drain(stdout: &mut OutputReader, stderr: &mut OutputReader, grace: Duration) -> bool {
    let both = async {
        let _ = tokio::join!(&mut stdout.handle, &mut stderr.handle);
    };
    tokio::time::timeout(grace, both).await.is_ok()
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; an empty group yields ESRCH
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

//! Probe gateway
//!
//! Runs one external process per call with a bounded lifetime. Failures
//! never propagate: spawn errors, timeouts and non-zero exits all come
//! back as a [`ProbeOutcome`] carrying a status and diagnostic text.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// How a probe invocation ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Process ran to completion. `None` when killed by a signal.
    Exited(Option<i32>),
    /// Process could not be started
    SpawnFailed,
    /// Process was still running when the timeout elapsed and was killed
    TimedOut,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Exited(Some(code)) => write!(f, "exit {}", code),
            ProbeStatus::Exited(None) => write!(f, "killed by signal"),
            ProbeStatus::SpawnFailed => write!(f, "spawn failed"),
            ProbeStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Status plus combined stdout/stderr, trimmed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub output: String,
}

impl ProbeOutcome {
    pub fn exited(code: i32, output: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Exited(Some(code)),
            output: output.into(),
        }
    }

    pub fn spawn_failed(diagnostic: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::SpawnFailed,
            output: diagnostic.into(),
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            status: ProbeStatus::TimedOut,
            output: format!("timed out after {:.1}s", timeout.as_secs_f64()),
        }
    }

    /// Exit code 0
    pub fn success(&self) -> bool {
        self.status == ProbeStatus::Exited(Some(0))
    }

    /// Last `n` lines of output, oldest first
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines: Vec<&str> = self.output.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

/// Executes external probes. The console only ever talks to probes
/// through this trait, which lets tests substitute scripted output.
///
/// `env` is added to the inherited environment of the child.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn execute(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &[(String, String)],
        timeout: Duration,
    ) -> ProbeOutcome;
}

/// Spawns real OS processes
#[derive(Clone, Debug, Default)]
pub struct ProcessGateway;

impl ProcessGateway {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn kill_group(pid: Option<u32>) {
        if let Some(pid) = pid {
            // The child leads its own session, so its pid is the group id
            unsafe {
                libc::killpg(pid as i32, libc::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    fn kill_group(_pid: Option<u32>) {}
}

#[async_trait]
impl Gateway for ProcessGateway {
    async fn execute(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &[(String, String)],
        timeout: Duration,
    ) -> ProbeOutcome {
        let Some((program, args)) = argv.split_first() else {
            return ProbeOutcome::spawn_failed("empty command");
        };

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // New session so a timeout can take down the whole process tree
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "probe spawn failed");
                return ProbeOutcome::spawn_failed(format!("{}: {}", program, e));
            }
        };
        let pid = child.id();
        tracing::debug!(program = %program, ?args, ?pid, "probe started");

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(out)) => {
                let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&out.stderr));
                let outcome = ProbeOutcome {
                    status: ProbeStatus::Exited(out.status.code()),
                    output: text.trim().to_string(),
                };
                tracing::debug!(program = %program, status = %outcome.status, "probe finished");
                outcome
            }
            Ok(Err(e)) => {
                tracing::warn!(program = %program, error = %e, "probe wait failed");
                ProbeOutcome::spawn_failed(format!("{}: {}", program, e))
            }
            Err(_) => {
                Self::kill_group(pid);
                tracing::warn!(program = %program, ?timeout, "probe timed out");
                ProbeOutcome::timed_out(timeout)
            }
        }
    }
}

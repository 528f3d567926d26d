//! External program runner.
//!
//! Video decoding and centroid analysis happen in separate programs
//! (`ffmpeg`, the processor jar). `CommandRunner` spawns one of them from a
//! [`CommandConfig`] template, captures its output and enforces a timeout.
//!
//! ```rust,ignore
//! let runner = CommandRunner::new(config.processing.thumbnail.clone());
//! let jpeg = runner
//!     .run(&Substitutions::new().with("input", path.display().to_string()))
//!     .await?;
//! ```

use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::CommandConfig;
use crate::error::{AppError, Result};

/// Cap on captured stdout (a thumbnail is well below this)
const MAX_STDOUT_BYTES: usize = 32 * 1024 * 1024;

/// How much of the end of stderr is kept for error messages
const STDERR_TAIL_BYTES: usize = 2 * 1024;

/// Placeholder values for a command template
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    pairs: Vec<(&'static str, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `{name}` to `value`
    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.pairs.push((name, value.into()));
        self
    }

    /// Replace every bound placeholder in `template`
    pub fn apply(&self, template: &str) -> String {
        self.pairs
            .iter()
            .fold(template.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{}}}", name), value)
            })
    }
}

/// Spawns a configured external program
#[derive(Debug, Clone)]
pub struct CommandRunner {
    config: CommandConfig,
}

impl CommandRunner {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    /// The argument list after substitution
    pub fn render_args(&self, vars: &Substitutions) -> Vec<String> {
        self.config.args.iter().map(|a| vars.apply(a)).collect()
    }

    /// Run the program to completion and return its stdout.
    ///
    /// # Errors
    /// `AppError::Processing` if the program cannot be spawned, exits
    /// non-zero or exceeds its timeout. The child is killed on timeout.
    pub async fn run(&self, vars: &Substitutions) -> Result<Vec<u8>> {
        let args = self.render_args(vars);
        let timeout = Duration::from_secs(self.config.timeout_seconds);

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            AppError::processing(format!("Failed to start {}: {}", self.config.program, e))
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(read_head(stdout, MAX_STDOUT_BYTES));
        let stderr_task = tokio::spawn(read_tail(stderr, STDERR_TAIL_BYTES));

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                // `child` is dropped here and killed
                warn!(
                    program = %self.config.program,
                    timeout_seconds = self.config.timeout_seconds,
                    "External program timed out"
                );
                return Err(AppError::processing(format!(
                    "{} timed out after {}s",
                    self.config.program, self.config.timeout_seconds
                )));
            }
        };

        let (stdout, stdout_truncated) = stdout_task
            .await
            .map_err(|e| AppError::internal(format!("stdout reader failed: {}", e)))??;
        let stderr = stderr_task
            .await
            .map_err(|e| AppError::internal(format!("stderr reader failed: {}", e)))??;

        debug!(
            program = %self.config.program,
            exit_code = status.code().unwrap_or(-1),
            stdout_bytes = stdout.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "External program finished"
        );

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let detail = stderr.trim();
            return Err(AppError::processing(if detail.is_empty() {
                format!("{} exited with {}", self.config.program, status)
            } else {
                format!("{} exited with {}: {}", self.config.program, status, detail)
            }));
        }

        if stdout_truncated {
            return Err(AppError::processing(format!(
                "{} wrote more than {} bytes to stdout",
                self.config.program, MAX_STDOUT_BYTES
            )));
        }

        Ok(stdout)
    }
}

/// Keep the first `limit` bytes and drain the rest, so the child never
/// blocks or sees a closed pipe. The flag is set if anything was dropped.
async fn read_head<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    let Some(mut h) = handle else {
        return Ok((buf, false));
    };

    (&mut h).take(limit as u64).read_to_end(&mut buf).await?;
    let dropped = tokio::io::copy(&mut h, &mut tokio::io::sink()).await?;
    Ok((buf, dropped > 0))
}

/// Read to EOF, keeping only the last `limit` bytes
async fn read_tail<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> io::Result<Vec<u8>> {
    let mut tail = Vec::new();
    let Some(mut h) = handle else {
        return Ok(tail);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = h.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        tail.extend_from_slice(&chunk[..n]);
        if tail.len() > 2 * limit {
            tail.drain(..tail.len() - limit);
        }
    }

    if tail.len() > limit {
        tail.drain(..tail.len() - limit);
    }
    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(program: &str, args: &[&str], timeout_seconds: u64) -> CommandRunner {
        CommandRunner::new(CommandConfig::new(program, args, timeout_seconds))
    }

    #[test]
    fn test_substitution() {
        let vars = Substitutions::new()
            .with("input", "/videos/a.mp4")
            .with("output", "/results/1.csv");
        let runner = runner("proc", &["-i", "{input}", "--out={output}", "{missing}"], 5);

        assert_eq!(
            runner.render_args(&vars),
            vec!["-i", "/videos/a.mp4", "--out=/results/1.csv", "{missing}"]
        );
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let vars = Substitutions::new().with("word", "centroid");
        let out = runner("echo", &["{word}"], 5).run(&vars).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap().trim(), "centroid");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_processing_error() {
        let err = runner("sh", &["-c", "echo bad input >&2; exit 3"], 5)
            .run(&Substitutions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Processing(_)));
        assert!(err.to_string().contains("bad input"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = runner("definitely-not-a-real-program-7f3a", &[], 5)
            .run(&Substitutions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Processing(_)));
    }

    /// Writes roughly 150 KiB of progress lines to stderr
    const CHATTY: &str =
        "i=0; while [ $i -lt 5000 ]; do echo \"progress frame $i of 5000....\" >&2; i=$((i+1)); done";

    #[tokio::test]
    async fn test_verbose_stderr_does_not_break_success() {
        let script = format!("{}; echo done", CHATTY);
        let out = runner("sh", &["-c", &script], 10)
            .run(&Substitutions::new())
            .await
            .unwrap();

        assert_eq!(out, b"done\n");
    }

    #[tokio::test]
    async fn test_failure_keeps_bounded_stderr_tail() {
        let script = format!("{}; echo last words >&2; exit 1", CHATTY);
        let err = runner("sh", &["-c", &script], 10)
            .run(&Substitutions::new())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.len() < STDERR_TAIL_BYTES + 256, "{} bytes", message.len());
        assert!(message.ends_with("last words"));
        assert!(!message.contains("progress frame 0 "));
    }

    #[tokio::test]
    async fn test_read_tail_keeps_end() {
        let data = (0..1000).map(|i| format!("{}\n", i)).collect::<String>();
        let tail = read_tail(Some(data.as_bytes()), 16).await.unwrap();

        assert_eq!(tail.len(), 16);
        assert!(String::from_utf8(tail).unwrap().ends_with("998\n999\n"));
    }

    #[tokio::test]
    async fn test_read_head_drains_overflow() {
        let data = vec![7u8; 100];
        let (head, truncated) = read_head(Some(&data[..]), 10).await.unwrap();
        assert_eq!(head, vec![7u8; 10]);
        assert!(truncated);

        let (head, truncated) = read_head(Some(&data[..]), 100).await.unwrap();
        assert_eq!(head.len(), 100);
        assert!(!truncated);
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = runner("sleep", &["5"], 1)
            .run(&Substitutions::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }
}

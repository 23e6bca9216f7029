// dumpbox/src/dumper/runner.rs
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fs::{self, File};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::{DumpError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs one producer command line through the shell and checks that it left
/// a non-empty output file behind.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(shell: impl Into<String>, timeout: Option<Duration>) -> Self {
        CommandRunner {
            shell: shell.into(),
            timeout,
        }
    }

    /// Executes `command_line` with stdout and stderr truncated into
    /// `log_path`, then validates `output_path`. Returns the output size.
    pub fn run(&self, command_line: &str, log_path: &Path, output_path: &Path) -> Result<u64> {
        let log_file = File::create(log_path).map_err(|e| {
            DumpError::execution_io(format!("unable to create log file {}", log_path.display()), e)
        })?;
        let stderr_file = log_file
            .try_clone()
            .map_err(|e| DumpError::execution_io("unable to share log file handle", e))?;

        debug!(shell = %self.shell, log = %log_path.display(), "launching producer");
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(stderr_file))
            // Own process group, so a timeout can take down the whole pipeline.
            .process_group(0)
            .spawn()
            .map_err(|e| DumpError::execution_io(format!("unable to launch {}", self.shell), e))?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(DumpError::execution(format!("producer exited with {}", status)));
        }

        validate_output(output_path)
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child
                .wait()
                .map_err(|e| DumpError::execution_io("unable to wait for producer", e));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= timeout => {
                    warn!(pid = child.id(), timeout = ?timeout, "producer timed out, killing");
                    kill_group(child);
                    let _ = child.wait();
                    return Err(DumpError::execution(format!(
                        "producer timed out after {:?}",
                        timeout
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(DumpError::execution_io("unable to wait for producer", e)),
            }
        }
    }
}

fn kill_group(child: &mut Child) {
    let pgid = child.id() as i32;
    if let Err(e) = signal::kill(Pid::from_raw(-pgid), Signal::SIGKILL) {
        warn!(pgid, error = %e, "unable to kill process group, killing leader only");
        let _ = child.kill();
    }
}

fn validate_output(output_path: &Path) -> Result<u64> {
    let meta = fs::metadata(output_path).map_err(|e| {
        DumpError::execution_io(format!("dump file {} missing", output_path.display()), e)
    })?;
    if meta.len() == 0 {
        return Err(DumpError::execution(format!(
            "empty dump file {}",
            output_path.display()
        )));
    }
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(timeout: Option<Duration>) -> CommandRunner {
        CommandRunner::new("sh", timeout)
    }

    #[test]
    fn test_successful_run_captures_output() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");
        let cmd = format!("echo to-stdout; echo to-stderr >&2; printf data > '{}'", out.display());

        let size = runner(None).run(&cmd, &log, &out)?;
        assert_eq!(size, 4);
        let log_content = fs::read_to_string(&log)?;
        assert!(log_content.contains("to-stdout"));
        assert!(log_content.contains("to-stderr"));
        Ok(())
    }

    #[test]
    fn test_log_is_truncated() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");
        fs::write(&log, "stale content from an earlier run\n")?;

        runner(None).run(&format!("echo fresh; printf x > '{}'", out.display()), &log, &out)?;
        assert_eq!(fs::read_to_string(&log)?, "fresh\n");
        Ok(())
    }

    #[test]
    fn test_non_zero_exit_fails_and_keeps_log() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");
        let cmd = format!("printf data > '{}'; echo boom >&2; exit 3", out.display());

        let err = runner(None).run(&cmd, &log, &out).unwrap_err();
        assert!(matches!(err, DumpError::ExecutionFailed { .. }));
        assert!(fs::read_to_string(&log)?.contains("boom"));
        Ok(())
    }

    #[test]
    fn test_empty_output_fails() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");

        let err = runner(None).run(&format!(": > '{}'", out.display()), &log, &out).unwrap_err();
        assert!(err.to_string().contains("empty dump file"));
        Ok(())
    }

    #[test]
    fn test_missing_output_fails() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");

        let err = runner(None).run("true", &log, &out).unwrap_err();
        assert!(matches!(err, DumpError::ExecutionFailed { .. }));
        assert!(log.exists());
        Ok(())
    }

    #[test]
    fn test_missing_shell_fails_to_launch() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let runner = CommandRunner::new("/nonexistent/shell", None);
        let err = runner
            .run("true", &tmp.path().join("log"), &tmp.path().join("out"))
            .unwrap_err();
        assert!(err.to_string().contains("unable to launch"));
        Ok(())
    }

    #[test]
    fn test_timeout_kills_pipeline() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let out = tmp.path().join("dump");
        let log = tmp.path().join("dump.log");
        let started = Instant::now();

        let err = runner(Some(Duration::from_millis(300)))
            .run(&format!("sleep 30 | cat > '{}'", out.display()), &log, &out)
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }
}

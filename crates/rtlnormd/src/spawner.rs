//! Runs rtl_433 as a child process

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, info, warn};

use rtlnorm::{Config, LineReader, LineReceiver};

/// How long to wait for each reader thread at shutdown
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the rtl_433 process and the threads which read it
///
/// Standard output and standard error are each drained by their
/// own [`LineReader`] so that a chatty stream never stalls the
/// child.
#[derive(Debug)]
pub struct ProcManager {
    child: Child,
    stdout_reader: LineReader,
    stdout: Option<LineReceiver>,
    stderr_reader: LineReader,
    stderr: LineReceiver,
}

impl ProcManager {
    /// Start the configured command
    ///
    /// The command line is split on whitespace. `wait` is the
    /// quiet period after which standard output reports
    /// [`Fetch::Idle`](rtlnorm::Fetch::Idle).
    pub fn spawn(config: &Config, wait: Duration) -> io::Result<Self> {
        let mut words = config.cmd.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut command = Command::new(program);
        command
            .args(words)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(path) = &config.path {
            command.env("PATH", prefix_path(path, env::var_os("PATH"))?);
        }
        if let Some(ld_library_path) = &config.ld_library_path {
            command.env("LD_LIBRARY_PATH", ld_library_path);
        }

        info!("starting \"{}\"", config.cmd);
        let mut child = command.spawn()?;
        debug!("spawned child process PID {}", child.id());

        let (stdout_reader, stdout, stderr_reader, stderr) =
            match (child.stdout.take(), child.stderr.take()) {
                (Some(out), Some(err)) => {
                    let (stdout_reader, stdout) =
                        LineReader::with_receiver("stdout-reader", out, wait)?;
                    let (stderr_reader, stderr) =
                        LineReader::with_receiver("stderr-reader", err, wait)?;
                    (stdout_reader, stdout, stderr_reader, stderr)
                }
                _ => {
                    drop(child.kill());
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "unable to create pipes to child process",
                    ));
                }
            };

        Ok(Self {
            child,
            stdout_reader,
            stdout: Some(stdout),
            stderr_reader,
            stderr,
        })
    }

    /// Take the standard output receiver
    ///
    /// Returns `None` if it has already been taken.
    pub fn take_stdout(&mut self) -> Option<LineReceiver> {
        self.stdout.take()
    }

    /// Lines of standard error received so far
    pub fn drain_stderr(&self) -> Vec<String> {
        self.stderr
            .drain()
            .into_iter()
            .map(|l| l.trim_end().to_owned())
            .collect()
    }

    /// Stop the child and the readers
    ///
    /// The child is killed if it is still running, which closes
    /// its pipes and lets the readers finish. Readers which do not
    /// exit within a timeout are abandoned. Returns the child's
    /// exit status, if it could be collected.
    pub fn shutdown(&mut self) -> Option<ExitStatus> {
        debug!("shutting down child process PID {}", self.child.id());

        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(e) = self.child.kill() {
                    warn!("unable to kill child process: {}", e);
                }
            }
            Err(e) => warn!("unable to poll child process: {}", e),
        }

        let status = match self.child.wait() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("unable to await child process exit: {}", e);
                None
            }
        };

        if !self.stdout_reader.shutdown(JOIN_TIMEOUT) {
            warn!("{}: abandoned", self.stdout_reader.name());
        }
        if !self.stderr_reader.shutdown(JOIN_TIMEOUT) {
            warn!("{}: abandoned", self.stderr_reader.name());
        }

        status
    }
}

// `dir` followed by the entries of `path`
fn prefix_path(dir: &Path, path: Option<OsString>) -> io::Result<OsString> {
    let mut dirs = vec![dir.to_path_buf()];
    if let Some(path) = path {
        dirs.extend(env::split_paths(&path));
    }
    env::join_paths(dirs).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rtlnorm::Fetch;

    #[cfg(unix)]
    #[test]
    fn test_prefix_path() {
        let path = prefix_path(Path::new("/opt/rtl/bin"), Some("/usr/bin:/bin".into()))
            .expect("path");
        assert_eq!(path, OsString::from("/opt/rtl/bin:/usr/bin:/bin"));

        let path = prefix_path(Path::new("/opt/rtl/bin"), None).expect("path");
        assert_eq!(path, OsString::from("/opt/rtl/bin"));

        assert!(prefix_path(Path::new("/opt:rtl"), None).is_err());
    }

    #[test]
    fn test_empty_command() {
        let config = Config {
            cmd: "   ".to_owned(),
            ..Config::default()
        };
        let err = ProcManager::spawn(&config, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_and_read() {
        let config = Config {
            cmd: "echo hello".to_owned(),
            ..Config::default()
        };
        let mut mgr = ProcManager::spawn(&config, Duration::from_secs(5)).expect("spawn");
        let lines: Vec<Fetch> = mgr.take_stdout().expect("stdout").collect();
        assert_eq!(lines, vec![Fetch::Line("hello\n".to_owned())]);
        assert!(mgr.take_stdout().is_none());

        let status = mgr.shutdown().expect("status");
        assert!(status.success());
        assert!(mgr.drain_stderr().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_shutdown_kills_running_child() {
        let config = Config {
            cmd: "sleep 60".to_owned(),
            ..Config::default()
        };
        let mut mgr = ProcManager::spawn(&config, Duration::from_millis(10)).expect("spawn");
        let _stdout = mgr.take_stdout().expect("stdout");

        let start = std::time::Instant::now();
        let status = mgr.shutdown().expect("status");
        assert!(!status.success());
        assert!(start.elapsed() < JOIN_TIMEOUT);
    }
}

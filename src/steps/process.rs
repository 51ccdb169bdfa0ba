//! Long-running processes (proxies, backends) kept alive for the scenario

use std::fs::File;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::common::{Error, Result};
use crate::driver::{Params, Step};

/// Poll interval while waiting on ports and exits
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Start a process and keep it running until cleanup
///
/// Arguments and the ready port are expanded against the parameters. With
/// a ready port, `run` only returns once something accepts connections on
/// `127.0.0.1:<port>`. Cleanup sends SIGTERM, waits out the grace period,
/// then kills.
#[derive(Debug)]
pub struct Spawn {
    label: String,
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    ready_port: Option<String>,
    ready_timeout: Duration,
    grace: Duration,
    log_file: Option<PathBuf>,
    child: Option<Child>,
}

impl Spawn {
    pub fn new(label: &str, program: &Path) -> Self {
        Self {
            label: label.to_string(),
            program: program.to_path_buf(),
            args: Vec::new(),
            env: Vec::new(),
            ready_port: None,
            ready_timeout: Duration::from_secs(15),
            grace: Duration::from_secs(2),
            log_file: None,
            child: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Port (template text, e.g. `{{.Ports.ClientAdmin}}`) to wait on
    pub fn ready_port(mut self, port: &str) -> Self {
        self.ready_port = Some(port.to_string());
        self
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Send stdout and stderr to this file instead of discarding them
    pub fn log_file(mut self, path: &Path) -> Self {
        self.log_file = Some(path.to_path_buf());
        self
    }

    /// OS process id while running
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn output_stdio(&self) -> Result<(Stdio, Stdio)> {
        let Some(path) = &self.log_file else {
            return Ok((Stdio::null(), Stdio::null()));
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| Error::CreateFile {
            path: path.clone(),
            source,
        })?;
        let err = file.try_clone()?;
        Ok((Stdio::from(file), Stdio::from(err)))
    }

    fn wait_ready(&mut self, port: u16) -> Result<()> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let deadline = Instant::now() + self.ready_timeout;

        loop {
            if TcpStream::connect_timeout(&addr, POLL_INTERVAL).is_ok() {
                tracing::debug!(label = %self.label, port, "process is ready");
                return Ok(());
            }

            if let Some(child) = self.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    return Err(Error::process(
                        &self.program_name(),
                        format!("exited with {} before opening port {}", status, port),
                    ));
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::process(
                    &self.program_name(),
                    format!(
                        "port {} not ready after {}s",
                        port,
                        self.ready_timeout.as_secs_f32()
                    ),
                ));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        #[cfg(unix)]
        {
            // SIGTERM first so the process can flush logs and stats
            let result = unsafe { libc::kill(child.id() as i32, libc::SIGTERM) };
            if result == 0 {
                let deadline = Instant::now() + self.grace;
                while Instant::now() < deadline {
                    match child.try_wait() {
                        Ok(Some(status)) => {
                            tracing::debug!(label = %self.label, %status, "process exited");
                            return;
                        }
                        Ok(None) => std::thread::sleep(POLL_INTERVAL),
                        Err(_) => break,
                    }
                }
            }
        }

        if let Err(e) = child.kill() {
            tracing::warn!(label = %self.label, error = %e, "failed to kill process");
        }
        let _ = child.wait();
    }
}

impl Step for Spawn {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        let args = self
            .args
            .iter()
            .map(|a| params.fill(a))
            .collect::<Result<Vec<_>>>()?;

        let ready_port = match &self.ready_port {
            Some(text) => {
                let filled = params.fill(text)?;
                let port = filled.trim().parse::<u16>().map_err(|_| {
                    Error::Config(format!("invalid ready port '{}'", filled))
                })?;
                Some(port)
            }
            None => None,
        };

        let (stdout, stderr) = self.output_stdio()?;
        tracing::info!(label = %self.label, program = %self.program_name(), ?args, "starting process");

        let child = Command::new(&self.program)
            .args(&args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| Error::process(&self.program_name(), format!("failed to start: {}", e)))?;
        self.child = Some(child);

        if let Some(port) = ready_port {
            if let Err(e) = self.wait_ready(port) {
                // A failed run is never cleaned up by the scenario.
                self.terminate();
                return Err(e);
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        tracing::info!(label = %self.label, "stopping process");
        self.terminate();
    }

    fn name(&self) -> String {
        format!("spawn {}", self.label)
    }
}

impl Drop for Spawn {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    #[test]
    fn test_spawn_and_cleanup() {
        let mut step = Spawn::new("sleeper", &sh())
            .args(["-c", "sleep 30"])
            .grace(Duration::from_millis(500));

        step.run(&mut Params::new(2)).unwrap();
        assert!(step.pid().is_some());

        step.cleanup();
        assert!(step.pid().is_none());

        // Idempotent
        step.cleanup();
    }

    #[test]
    fn test_ready_port_already_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut params = Params::new(2).with_port("Backend", port);

        let mut step = Spawn::new("waiter", &sh())
            .args(["-c", "sleep 30"])
            .ready_port("{{.Ports.Backend}}")
            .ready_timeout(Duration::from_secs(2));

        step.run(&mut params).unwrap();
        step.cleanup();
    }

    #[test]
    fn test_early_exit_fails_run() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut params = Params::new(2).with_port("Admin", port);
        let mut step = Spawn::new("crasher", &sh())
            .args(["-c", "exit 1"])
            .ready_port("{{.Ports.Admin}}")
            .ready_timeout(Duration::from_secs(5));

        let err = step.run(&mut params).unwrap_err();
        assert!(matches!(err, Error::Process { .. }));
        assert!(step.pid().is_none());
    }

    #[test]
    fn test_missing_program() {
        let mut step = Spawn::new("ghost", Path::new("/nonexistent/bin/proxy"));
        let err = step.run(&mut Params::new(2)).unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn test_args_are_filled() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("out.log");
        let mut params = Params::new(3).with_var("greeting", "hello");

        let mut step = Spawn::new("echo", &sh())
            .args(["-c", "echo {{.Vars.greeting}} v{{.XDS}}"])
            .log_file(&log);
        step.run(&mut params).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if std::fs::read_to_string(&log).unwrap_or_default().contains("hello v3") {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        step.cleanup();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "hello v3\n");
    }
}

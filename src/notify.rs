//! Push notification dispatch through an external helper process.
//!
//! The helper receives `species snapshot_path alert_level` as trailing
//! arguments. Delivery is best-effort: the pipeline logs failures and moves on.

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::snapshot::AlertLevel;

pub const DEFAULT_NOTIFY_PROGRAM: &str = "node";
pub const DEFAULT_NOTIFY_ARGS: [&str; 1] = ["sendNotification.js"];
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Helper stderr kept for error messages. The rest is read and discarded.
const STDERR_CAPTURE_LIMIT: usize = 4096;

/// Side channel for detection alerts.
pub trait Notifier {
    fn notify(&mut self, species: &str, snapshot_path: &str, alert_level: AlertLevel) -> Result<()>;
}

/// Runs a command per notification and waits up to `timeout` for it to exit.
#[derive(Clone, Debug)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNotifier {
    /// `command` is the program followed by its leading arguments.
    pub fn new(command: &[String], timeout: Duration) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("notification command cannot be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn spawn(&self, species: &str, snapshot_path: &str, alert_level: AlertLevel) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(species)
            .arg(snapshot_path)
            .arg(alert_level.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn notifier '{}'", self.program))
    }
}

impl Default for CommandNotifier {
    fn default() -> Self {
        Self {
            program: DEFAULT_NOTIFY_PROGRAM.to_string(),
            args: DEFAULT_NOTIFY_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&mut self, species: &str, snapshot_path: &str, alert_level: AlertLevel) -> Result<()> {
        let mut child = self.spawn(species, snapshot_path, alert_level)?;
        let stderr_reader = child.stderr.take().map(drain_stderr);
        let status = wait_with_timeout(&mut child, self.timeout)?;
        if status.success() {
            return Ok(());
        }
        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Err(anyhow!(
            "notifier exited with {}: {}",
            status,
            stderr.trim()
        ))
    }
}

/// Read the helper's stderr to EOF on a separate thread so a chatty helper
/// never blocks on a full pipe. Keeps the first `STDERR_CAPTURE_LIMIT` bytes.
fn drain_stderr(mut pipe: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut kept = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let room = STDERR_CAPTURE_LIMIT.saturating_sub(kept.len());
                    kept.extend_from_slice(&buf[..n.min(room)]);
                }
            }
        }
        String::from_utf8_lossy(&kept).into_owned()
    })
}

/// Wait for `child` to exit, killing it once `timeout` has elapsed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().context("failed to poll notifier")? {
            return Ok(status);
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!(
                "notifier timed out after {:.1}s",
                timeout.as_secs_f64()
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Notifier that drops every alert. Used when notifications are disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _species: &str, _snapshot_path: &str, _alert_level: AlertLevel) -> Result<()> {
        Ok(())
    }
}

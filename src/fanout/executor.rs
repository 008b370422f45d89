//! Bounded-concurrency fan-out: one child process per host, a marker
//! substituted into its argument template, output streamed through
//! [`Sinks`].

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::error::SpawnError;
use super::sink::{ExitOutcome, Sinks};

/// The marker substituted with a host's name in every argument (the
/// command path itself is never substituted).
pub const NODE_MARKER: &str = "__NODE__";

/// Lines longer than this are reported through `on_stderr` with an error
/// marker instead of being delivered whole. Enforced as bytes arrive, so a
/// child writing an unbounded line with no newline can't grow the scanner's
/// buffer past this bound.
const MAX_LINE_BYTES: usize = 1 << 20;

/// Size of the raw read performed on each `poll`; independent of
/// `MAX_LINE_BYTES`, just a reasonable syscall granularity.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Runs `command` once per host in `hosts`, with `__NODE__` in `args`
/// replaced by the host name, at most `max_flight` children running at
/// once. One-shot: consumes `self`.
pub struct FanoutExecutor {
    hosts: Vec<String>,
    command: String,
    args: Vec<String>,
    max_flight: usize,
}

impl FanoutExecutor {
    pub fn new(hosts: Vec<String>, command: impl Into<String>, args: Vec<String>, max_flight: usize) -> Self {
        FanoutExecutor {
            hosts,
            command: command.into(),
            args,
            max_flight: max_flight.max(1),
        }
    }

    /// Runs every host to completion. Returns only after every child has
    /// exited and every sink call has been made.
    pub async fn run(self, sinks: Arc<dyn Sinks>) {
        let semaphore = Arc::new(Semaphore::new(self.max_flight));
        let command = Arc::new(self.command);
        let args_template = Arc::new(self.args);

        let mut tasks = Vec::with_capacity(self.hosts.len());
        for host in self.hosts {
            let semaphore = semaphore.clone();
            let command = command.clone();
            let args_template = args_template.clone();
            let sinks = sinks.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fanout semaphore is never closed");
                run_one_host(&command, &args_template, host, sinks).await;
            }));
        }

        for task in tasks {
            let _ = task.await;
        }
    }
}

async fn run_one_host(command: &str, args_template: &[String], host: String, sinks: Arc<dyn Sinks>) {
    let args = substitute_marker(args_template, &host);

    let mut child = match Command::new(command)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(source) => {
            let err = SpawnError::Spawn {
                host: host.clone(),
                source,
            };
            sinks.on_exit(&host, &ExitOutcome::Failed(err.to_string()));
            return;
        }
    };

    let Some(stdout) = child.stdout.take() else {
        sinks.on_exit(
            &host,
            &ExitOutcome::Failed(SpawnError::MissingStdout { host: host.clone() }.to_string()),
        );
        return;
    };
    let Some(stderr) = child.stderr.take() else {
        sinks.on_exit(
            &host,
            &ExitOutcome::Failed(SpawnError::MissingStderr { host: host.clone() }.to_string()),
        );
        return;
    };

    let stdout_host = host.clone();
    let stdout_sinks = sinks.clone();
    let stdout_task = tokio::spawn(async move {
        pump_lines(stdout, &stdout_host, &stdout_sinks, StreamKind::Stdout).await;
    });

    let stderr_host = host.clone();
    let stderr_sinks = sinks.clone();
    let stderr_task = tokio::spawn(async move {
        pump_lines(stderr, &stderr_host, &stderr_sinks, StreamKind::Stderr).await;
    });

    // Both readers must drain to EOF before `on_exit` fires, so that
    // ordering holds even though the child may close its pipes before the
    // process itself has been reaped.
    let _ = stdout_task.await;
    let _ = stderr_task.await;

    match child.wait().await {
        Ok(status) if status.success() => sinks.on_exit(&host, &ExitOutcome::Success),
        Ok(status) => sinks.on_exit(&host, &ExitOutcome::Failed(format!("exit status: {}", status))),
        Err(source) => sinks.on_exit(
            &host,
            &ExitOutcome::Failed(SpawnError::Wait { host: host.clone(), source }.to_string()),
        ),
    }
}

fn substitute_marker(args_template: &[String], host: &str) -> Vec<String> {
    args_template.iter().map(|arg| arg.replace(NODE_MARKER, host)).collect()
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

/// Scans `reader` for newline-terminated lines without ever buffering more
/// than `MAX_LINE_BYTES` of a single line: bytes are read in fixed-size
/// chunks and appended to the in-progress line one chunk at a time, with the
/// cap checked per byte rather than after a whole line has accumulated. A
/// child writing gigabytes with no newline is reported once the cap is first
/// crossed and then has the rest of that line discarded, not buffered.
async fn pump_lines<R>(mut reader: R, host: &str, sinks: &Arc<dyn Sinks>, kind: StreamKind)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    let mut line = Vec::new();
    let mut overflowed = false;

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => {
                if overflowed {
                    sinks.on_stderr(host, &format!("<line exceeded {} bytes, dropped>", MAX_LINE_BYTES));
                } else if !line.is_empty() {
                    deliver_line(host, &line, sinks, kind);
                }
                break;
            }
            Ok(n) => n,
            Err(e) => {
                sinks.on_stderr(host, &format!("<error reading stream: {}>", e));
                break;
            }
        };

        for &byte in &chunk[..n] {
            if byte == b'\n' {
                if overflowed {
                    sinks.on_stderr(host, &format!("<line exceeded {} bytes, dropped>", MAX_LINE_BYTES));
                } else {
                    deliver_line(host, &line, sinks, kind);
                }
                line.clear();
                overflowed = false;
            } else if line.len() < MAX_LINE_BYTES {
                line.push(byte);
            } else {
                overflowed = true;
            }
        }
    }
}

fn deliver_line(host: &str, raw: &[u8], sinks: &Arc<dyn Sinks>, kind: StreamKind) {
    let mut raw = raw;
    if raw.last() == Some(&b'\r') {
        raw = &raw[..raw.len() - 1];
    }
    let line = String::from_utf8_lossy(raw);
    match kind {
        StreamKind::Stdout => sinks.on_stdout(host, &line),
        StreamKind::Stderr => sinks.on_stderr(host, &line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSinks {
        stdout: Mutex<Vec<(String, String)>>,
        stderr: Mutex<Vec<(String, String)>>,
        exits: Mutex<Vec<(String, bool)>>,
    }

    impl Sinks for RecordingSinks {
        fn on_stdout(&self, host: &str, line: &str) {
            self.stdout.lock().unwrap().push((host.to_string(), line.to_string()));
        }
        fn on_stderr(&self, host: &str, line: &str) {
            self.stderr.lock().unwrap().push((host.to_string(), line.to_string()));
        }
        fn on_exit(&self, host: &str, outcome: &ExitOutcome) {
            self.exits
                .lock()
                .unwrap()
                .push((host.to_string(), matches!(outcome, ExitOutcome::Success)));
        }
    }

    #[tokio::test]
    async fn runs_one_child_per_host_with_marker_substitution() {
        let sinks = Arc::new(RecordingSinks::default());
        let executor = FanoutExecutor::new(
            vec!["host1".to_string(), "host2".to_string()],
            "/bin/echo",
            vec!["__NODE__".to_string()],
            2,
        );
        executor.run(sinks.clone()).await;

        let stdout = sinks.stdout.lock().unwrap();
        let mut lines: Vec<&str> = stdout.iter().map(|(_, l)| l.as_str()).collect();
        lines.sort();
        assert_eq!(lines, vec!["host1", "host2"]);

        let exits = sinks.exits.lock().unwrap();
        assert_eq!(exits.len(), 2);
        assert!(exits.iter().all(|(_, success)| *success));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_as_failure_not_an_error() {
        let sinks = Arc::new(RecordingSinks::default());
        let executor = FanoutExecutor::new(
            vec!["host1".to_string()],
            "/bin/sh",
            vec!["-c".to_string(), "exit 3".to_string()],
            1,
        );
        executor.run(sinks.clone()).await;

        let exits = sinks.exits.lock().unwrap();
        assert_eq!(exits.len(), 1);
        assert!(!exits[0].1);
    }

    #[tokio::test]
    async fn missing_command_reports_on_exit_instead_of_panicking() {
        let sinks = Arc::new(RecordingSinks::default());
        let executor = FanoutExecutor::new(
            vec!["host1".to_string()],
            "/no/such/binary-rangefan-test",
            vec![],
            1,
        );
        executor.run(sinks.clone()).await;

        let exits = sinks.exits.lock().unwrap();
        assert_eq!(exits.len(), 1);
        assert!(!exits[0].1);
    }

    #[tokio::test]
    async fn respects_max_flight_concurrency_cap() {
        let sinks = Arc::new(RecordingSinks::default());
        let hosts: Vec<String> = (0..5).map(|i| format!("host{}", i)).collect();
        let executor = FanoutExecutor::new(hosts, "/bin/echo", vec!["__NODE__".to_string()], 2);
        executor.run(sinks.clone()).await;

        assert_eq!(sinks.exits.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn overlong_line_is_reported_without_buffering_it_whole() {
        let sinks = Arc::new(RecordingSinks::default());
        let mut data = vec![b'a'; MAX_LINE_BYTES + 10];
        data.push(b'\n');
        data.extend_from_slice(b"short\n");
        let cursor = std::io::Cursor::new(data);

        pump_lines(cursor, "host1", &sinks, StreamKind::Stdout).await;

        let stdout = sinks.stdout.lock().unwrap();
        assert_eq!(stdout.len(), 1);
        assert_eq!(stdout[0].1, "short");

        let stderr = sinks.stderr.lock().unwrap();
        assert_eq!(stderr.len(), 1);
        assert!(stderr[0].1.contains("exceeded"));
    }
}

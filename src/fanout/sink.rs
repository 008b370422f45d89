//! The three-callback sink contract `FanoutExecutor` reports through, plus
//! the default printing implementation.

/// How a single host's child process finished.
#[derive(Debug, Clone)]
pub enum ExitOutcome {
    Success,
    Failed(String),
}

/// Receives per-host output and completion events. Implementations must be
/// safe to call concurrently: the executor makes no attempt to serialize
/// calls across hosts, or between a host's stdout and stderr readers.
pub trait Sinks: Send + Sync {
    fn on_stdout(&self, host: &str, line: &str);
    fn on_stderr(&self, host: &str, line: &str);
    /// Invoked exactly once per host, strictly after every `on_stdout`/
    /// `on_stderr` call for that host has returned.
    fn on_exit(&self, host: &str, outcome: &ExitOutcome);
}

/// Prints `host:stdout:<line>`, `host:stderr:<line>`, and either
/// `host:success` or `host:failed:<err>`.
pub struct PrintingSinks;

impl Sinks for PrintingSinks {
    fn on_stdout(&self, host: &str, line: &str) {
        println!("{}:stdout:{}", host, line);
    }

    fn on_stderr(&self, host: &str, line: &str) {
        println!("{}:stderr:{}", host, line);
    }

    fn on_exit(&self, host: &str, outcome: &ExitOutcome) {
        match outcome {
            ExitOutcome::Success => println!("{}:success", host),
            ExitOutcome::Failed(err) => println!("{}:failed:{}", host, err),
        }
    }
}

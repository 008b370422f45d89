//! Flag parsing for the fan-out front end.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rangefan")]
#[command(about = "Run a command across a set of hosts in parallel")]
#[command(version)]
pub struct Cli {
    /// Maximum number of parallel processes
    #[arg(short = 'm', long = "maxflight", default_value_t = 50)]
    pub maxflight: usize,

    /// Timeout in seconds for the initial connection
    #[arg(short = 't', long = "timeout", default_value_t = 10)]
    pub timeout: u32,

    /// File to read hostnames from, one per line (default: stdin)
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Range expression to resolve hosts from, instead of file/stdin
    #[arg(short = 'r')]
    pub range_expr: Option<String>,

    /// Directory of YAML cluster files to load before resolving `-r`
    #[arg(long = "clusters")]
    pub clusters: Option<String>,

    /// Collapse identical output across hosts into one compressed line
    /// (requires `-r`)
    #[arg(short = 'c', long = "collapse")]
    pub collapse: bool,

    /// Raise the log level; repeat for more detail
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to run on each host
    pub command: String,

    /// Arguments to the command; `__NODE__` is replaced with the host name
    pub args: Vec<String>,
}

impl Cli {
    /// The `tracing` level implied by the verbosity count (`-v`/`--verbose`,
    /// repeatable).
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["rangefan", "uptime"]);
        assert_eq!(cli.command, "uptime");
        assert_eq!(cli.maxflight, 50);
        assert_eq!(cli.timeout, 10);
        assert!(!cli.collapse);
    }

    #[test]
    fn parses_range_and_collapse_flags() {
        let cli = Cli::parse_from(["rangefan", "-r", "web*", "-c", "uptime"]);
        assert_eq!(cli.range_expr.as_deref(), Some("web*"));
        assert!(cli.collapse);
    }

    #[test]
    fn verbose_flag_raises_log_level() {
        let quiet = Cli::parse_from(["rangefan", "uptime"]);
        assert_eq!(quiet.log_level(), tracing::Level::WARN);

        let loud = Cli::parse_from(["rangefan", "-vv", "uptime"]);
        assert_eq!(loud.log_level(), tracing::Level::DEBUG);
    }
}

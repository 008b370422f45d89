//! Error taxonomy for running a command across a set of hosts.

use thiserror::Error;

/// Failure to even start a child process for one host. Command failure
/// once started (non-zero exit, signal) is not an error — it's reported
/// through [`crate::fanout::sink::Sinks::on_exit`] like any other result.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("spawning command for {host}: {source}")]
    Spawn {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("capturing stdout for {host}")]
    MissingStdout { host: String },

    #[error("capturing stderr for {host}")]
    MissingStderr { host: String },

    #[error("waiting on command for {host}: {source}")]
    Wait {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

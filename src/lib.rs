//! rangefan - range-expression host resolution and bounded-concurrency
//! command fan-out.
//!
//! [`range`] parses and evaluates the cluster query language; [`fanout`]
//! runs a command across the resulting hosts with a concurrency cap.
//! [`client`] and [`range::loader`] are CLI-facing conveniences for getting
//! a host list in the first place; the core engines never touch the
//! network or the filesystem.

pub mod cli;
pub mod client;
pub mod config;
pub mod fanout;
pub mod range;

pub use config::RangeConfig;
pub use fanout::{ExitOutcome, FanoutExecutor, PrintingSinks, Sinks, SpawnError};
pub use range::{load_clusters_dir, prime_cache, query, AstNode, RangeError, RangeResult, RangeState};

use std::collections::BTreeMap;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;

use rangefan::cli::Cli;
use rangefan::client::RangeServiceClient;
use rangefan::range::compress::compress;
use rangefan::{load_clusters_dir, query, ExitOutcome, FanoutExecutor, PrintingSinks, RangeConfig, RangeResult, Sinks};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    install_logging(cli.log_level());

    let hosts = resolve_hosts(&cli).await?;

    let timeout_arg = format!("ConnectTimeout={}", cli.timeout);
    let mut args = vec![
        rangefan::fanout::NODE_MARKER.to_string(),
        "-n".to_string(),
        "-o".to_string(),
        timeout_arg,
    ];
    args.extend(cli.args.clone());

    let executor = FanoutExecutor::new(hosts, cli.command.clone(), args, cli.maxflight);

    if cli.collapse {
        let sinks = Arc::new(CollapsingSinks::default());
        executor.run(sinks.clone()).await;
        sinks.print_collapsed();
    } else {
        executor.run(Arc::new(PrintingSinks)).await;
    }

    Ok(())
}

fn install_logging(level: tracing::Level) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Builds the host list from `-r` (locally via `--clusters`, or remotely
/// via the range service), `-f`, or stdin, in that priority order.
async fn resolve_hosts(cli: &Cli) -> Result<Vec<String>> {
    if let Some(expr) = &cli.range_expr {
        let mut hosts = if let Some(dir) = &cli.clusters {
            tracing::info!(dir = %dir, "loading clusters before expanding range expression");
            let mut state = load_clusters_dir(Path::new(dir))
                .with_context(|| format!("loading clusters from {}", dir))?;
            let config = RangeConfig::default();
            let result = query(&mut state, &config, expr)
                .with_context(|| format!("expanding range expression {:?}", expr))?;
            result.to_vec()
        } else {
            let client = RangeServiceClient::from_env();
            client
                .expand(expr)
                .await
                .with_context(|| format!("expanding range expression {:?} via range service", expr))?
        };
        hosts.sort();
        Ok(hosts)
    } else if let Some(file) = &cli.file {
        let contents =
            std::fs::read_to_string(file).with_context(|| format!("opening host file {}", file))?;
        Ok(non_empty_lines(&contents))
    } else {
        if std::io::stdin().is_terminal() {
            bail!("no hosts provided: use -f, -r, or pipe hostnames via stdin");
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(non_empty_lines(&buf))
    }
}

fn non_empty_lines(s: &str) -> Vec<String> {
    s.lines().map(|l| l.to_string()).filter(|l| !l.is_empty()).collect()
}

/// Buckets identical output lines (and exit outcomes) across hosts, then
/// prints each bucket as `<compressed hosts> <LABEL> <line>`.
#[derive(Default)]
struct CollapsingSinks {
    stdout: Mutex<BTreeMap<String, Vec<String>>>,
    stderr: Mutex<BTreeMap<String, Vec<String>>>,
    exit: Mutex<BTreeMap<String, Vec<String>>>,
}

impl Sinks for CollapsingSinks {
    fn on_stdout(&self, host: &str, line: &str) {
        self.stdout.lock().unwrap().entry(line.to_string()).or_default().push(host.to_string());
    }

    fn on_stderr(&self, host: &str, line: &str) {
        self.stderr.lock().unwrap().entry(line.to_string()).or_default().push(host.to_string());
    }

    fn on_exit(&self, host: &str, outcome: &ExitOutcome) {
        let key = match outcome {
            ExitOutcome::Success => "success".to_string(),
            ExitOutcome::Failed(err) => err.clone(),
        };
        self.exit.lock().unwrap().entry(key).or_default().push(host.to_string());
    }
}

impl CollapsingSinks {
    fn print_collapsed(&self) {
        Self::print_bucket(&self.stdout.lock().unwrap(), "STDOUT");
        Self::print_bucket(&self.stderr.lock().unwrap(), "STDERR");
        Self::print_bucket(&self.exit.lock().unwrap(), "STATUS");
    }

    fn print_bucket(bucket: &BTreeMap<String, Vec<String>>, label: &str) {
        for (output, hosts) in bucket {
            let result = RangeResult::from_iter_unchecked(hosts.iter().cloned());
            println!("{} {} {}", compress(&result), label, output);
        }
    }
}

//! HTTP client for a remote range-expansion service. The evaluator core
//! never performs network I/O; this is strictly CLI-facing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("requesting range expansion: {0}")]
    Request(#[from] reqwest::Error),
}

/// Talks to a `range`-protocol HTTP service: `GET /range/list?<query>`
/// returns a newline-delimited list of hosts.
#[derive(Debug, Clone)]
pub struct RangeServiceClient {
    host: String,
    port: u16,
    ssl: bool,
    client: reqwest::Client,
}

impl RangeServiceClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        RangeServiceClient {
            host: host.into(),
            port,
            ssl: false,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_ssl(host: impl Into<String>, port: u16) -> Self {
        RangeServiceClient {
            host: host.into(),
            port,
            ssl: true,
            client: reqwest::Client::new(),
        }
    }

    /// Builds a client from the `RANGE_HOST`/`RANGE_PORT`/`RANGE_SSL`
    /// environment overrides, falling back to `range:80` over plain HTTP.
    pub fn from_env() -> Self {
        let host = std::env::var("RANGE_HOST").unwrap_or_else(|_| "range".to_string());
        let port = std::env::var("RANGE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(80);
        let ssl = std::env::var("RANGE_SSL")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if ssl {
            Self::with_ssl(host, port)
        } else {
            Self::new(host, port)
        }
    }

    /// Expands `query` against the remote service, returning a sorted,
    /// deduplicated list of hosts.
    pub async fn expand(&self, query: &str) -> Result<Vec<String>, ClientError> {
        let scheme = if self.ssl { "https" } else { "http" };
        let url = format!(
            "{}://{}:{}/range/list?{}",
            scheme,
            self.host,
            self.port,
            percent_encode_query(query)
        );

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let mut hosts: Vec<String> = body.lines().map(|l| l.to_string()).filter(|l| !l.is_empty()).collect();
        hosts.sort();
        hosts.dedup();
        Ok(hosts)
    }
}

/// Percent-encodes everything but unreserved characters, matching the
/// effect of Go's `url.QueryEscape` closely enough for this query shape
/// (range expressions use no characters outside ASCII punctuation).
fn percent_encode_query(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

//! Normalizes a [`RangeResult`] back into a compact range expression, e.g.
//! `{web1,web2,web3}.example.com` instead of three separate hostnames.
//!
//! Splits each node on its first `.` into a domain-less head and a domain
//! suffix, folds consecutive numeric runs within each bucket, then stitches
//! the buckets back together.

use regex_lite::Regex;
use std::collections::BTreeMap;

use super::result::RangeResult;

/// Renders `result` as a single range expression that would re-expand to
/// (a superset of, in the case of zero-padding differences) the same set.
pub fn compress(result: &RangeResult) -> String {
    let mut no_domain = Vec::new();
    let mut domains: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for node in result.iter() {
        match node.split_once('.') {
            Some((head, domain)) => domains.entry(domain.to_string()).or_default().push(head.to_string()),
            None => no_domain.push(node.clone()),
        }
    }
    no_domain.sort();

    let mut parts = compress_numeric(no_domain);

    for (domain, mut nodes) in domains {
        nodes.sort();
        let compressed = compress_numeric(nodes);
        let joined = if compressed.len() > 1 {
            format!("{{{}}}", compressed.join(","))
        } else {
            compressed.join(",")
        };
        parts.push(format!("{}.{}", joined, domain));
    }

    parts.join(",")
}

fn numeric_expansion_for(prefix: &str, start: i64, end: &str, suffix: &str) -> String {
    let end_n: i64 = end.parse().unwrap_or(0);
    if start == end_n {
        format!("{}{}{}", prefix, end, suffix)
    } else {
        let leading_zeros = "0".repeat(end.len().saturating_sub(start.to_string().len()));
        format!("{}{}{}..{}{}", prefix, leading_zeros, start, end_n, suffix)
    }
}

fn numeric_suffix_regex() -> Regex {
    Regex::new(r"^(.*?)(\d+)([^\d]*)$").expect("static pattern compiles")
}

#[derive(Default)]
struct NumericRun {
    prefix: String,
    suffix: String,
    nstr: String,
    start: i64,
    current: i64,
}

impl NumericRun {
    fn new() -> Self {
        NumericRun {
            start: -1,
            current: -1,
            ..NumericRun::default()
        }
    }

    fn flush(&mut self, out: &mut Vec<String>) {
        if self.start > -1 {
            out.push(numeric_expansion_for(&self.prefix, self.start, &self.nstr, &self.suffix));
            self.start = -1;
            self.current = -1;
            self.prefix.clear();
            self.suffix.clear();
            self.nstr.clear();
        }
    }
}

fn compress_numeric(nodes: Vec<String>) -> Vec<String> {
    let re = numeric_suffix_regex();
    let mut result = Vec::new();
    let mut run = NumericRun::new();

    for node in nodes {
        let Some(caps) = re.captures(&node) else {
            run.flush(&mut result);
            result.push(node);
            continue;
        };

        let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
        let n = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
        let suffix = caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string();

        if prefix != run.prefix || suffix != run.suffix {
            run.flush(&mut result);
        }

        let new_n: i64 = n.parse().unwrap_or(0);
        if run.start < 0 || new_n != run.current + 1 {
            run.flush(&mut result);
            run.start = new_n;
        }

        run.nstr = n;
        run.current = new_n;
        run.prefix = prefix;
        run.suffix = suffix;
    }
    run.flush(&mut result);
    result
}

//! The query visitor: walks an [`AstNode`] against a [`RangeState`] and
//! produces a [`RangeResult`].
//!
//! One function per node kind; deliberate deviations from the obvious
//! literal reading of a node's semantics are recorded in `DESIGN.md`.

use regex_lite::Regex;

use super::ast::{AstNode, OperatorKind};
use super::context::EvalContext;
use super::error::RangeError;
use super::parser;
use super::result::{AddOutcome, RangeResult};
use super::state::{RangeState, CLUSTER_KEY, KEYS_KEY};
use crate::config::RangeConfig;

/// Parses and evaluates `input` against `state` from a fresh top-level
/// context. This is the engine's single public entry point.
pub fn query(state: &mut RangeState, config: &RangeConfig, input: &str) -> Result<RangeResult, RangeError> {
    if input.chars().count() > config.max_query_size {
        return Err(RangeError::ValueTooLarge {
            value: input.to_string(),
        });
    }
    let ast = parser::parse(input)?;
    let ctx = EvalContext::new();
    eval_node(state, config, &ctx, &ast)
}

/// Eagerly expands and caches every `(cluster, key)` pair in `state`. A
/// state that has been fully primed is safe to query from multiple threads
/// concurrently, since every cluster/key lookup then becomes a pure cache
/// read rather than a first-time evaluation racing to populate the cache.
///
/// Errors are collected rather than aborting the walk early — a malformed
/// key elsewhere in the catalog shouldn't stop the rest from priming.
pub fn prime_cache(state: &mut RangeState, config: &RangeConfig) -> Vec<RangeError> {
    let mut errors = Vec::new();
    let mut cluster_names: Vec<String> = state.cluster_names().cloned().collect();
    cluster_names.sort();

    for cluster_name in cluster_names {
        let Some(cluster) = state.get_cluster(&cluster_name).cloned() else {
            continue;
        };
        let mut keys: Vec<String> = cluster.keys().cloned().collect();
        keys.sort();

        let ctx = EvalContext::new().child_with_cluster(cluster_name.clone());
        for key in keys {
            let mut result = RangeResult::new();
            if let Err(e) = cluster_key_lookup(state, config, &ctx, &cluster_name, &key, &mut result) {
                errors.push(e);
            }
        }
    }
    errors
}

fn eval_node(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    node: &AstNode,
) -> Result<RangeResult, RangeError> {
    if ctx.depth > config.max_query_depth {
        return Err(RangeError::DepthExceeded);
    }

    match node {
        AstNode::Null => Ok(RangeResult::new()),
        AstNode::Text(val) => eval_text(config, val),
        AstNode::Constant(val) => {
            let mut result = RangeResult::new();
            result.try_add(config, val)?;
            Ok(result)
        }
        AstNode::Regex(pattern) => eval_regex(state, config, ctx, pattern),
        AstNode::LocalClusterLookup(key) => {
            let cluster_name = ctx
                .current_cluster
                .clone()
                .unwrap_or_else(|| config.default_cluster.clone());
            let mut result = RangeResult::new();
            cluster_key_lookup(state, config, ctx, &cluster_name, key, &mut result)?;
            Ok(result)
        }
        AstNode::GroupQuery(inner) => eval_group_query(state, config, ctx, inner),
        AstNode::ClusterLookup { cluster, key } => eval_cluster_lookup(state, config, ctx, cluster, key),
        AstNode::Operator { kind, left, right } => eval_operator(state, config, ctx, *kind, left, right),
        AstNode::Braces { middle, left, right } => eval_braces(state, config, ctx, middle, left, right),
        AstNode::Function { name, args } => eval_function(state, config, ctx, name, args),
    }
}

/// Numeric expansion for a bare word.
///
/// `a1..b4`-shaped input, where the text following `..` carries its own
/// non-digit prefix that disagrees with the left prefix, is emitted
/// verbatim and the numeric expansion is skipped — the reading `DESIGN.md`
/// settles on for this case (see the "a1..b4" entry there).
fn eval_text(config: &RangeConfig, val: &str) -> Result<RangeResult, RangeError> {
    let mut result = RangeResult::new();

    let Some(caps) = numeric_range_regex().captures(val) else {
        result.try_add(config, val)?;
        return Ok(result);
    };

    let mut left_str = caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
    let mut left_digits = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
    let right_str = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let right_digits = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    let trailing = caps.get(5).map(|m| m.as_str()).unwrap_or("");

    if !right_str.is_empty() && left_str != right_str {
        result.try_add(config, val)?;
        return Ok(result);
    }

    while left_digits.len() > right_digits.len() {
        left_str.push(left_digits.remove(0));
    }

    let width = left_digits.len();
    let low: u64 = left_digits.parse().unwrap_or(0);
    let high: u64 = right_digits.parse().unwrap_or(0);

    if low <= high {
        for x in low..=high {
            let formatted = format!("{}{:0width$}{}", left_str, x, trailing, width = width);
            if let AddOutcome::Capped = result.try_add(config, &formatted)? {
                break;
            }
        }
    }

    Ok(result)
}

fn numeric_range_regex() -> Regex {
    Regex::new(r"^(.*?)(\d+)\.\.([^\d]*?)?(\d+)(.*)$").expect("static pattern compiles")
}

fn eval_regex(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    pattern: &str,
) -> Result<RangeResult, RangeError> {
    let re = Regex::new(pattern).map_err(|e| RangeError::RegexCompile {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let candidates = match &ctx.working_set {
        Some(ws) => ws.clone(),
        None => {
            // Same candidate set a bare `@{%DEFAULT:KEYS}` query would produce,
            // built directly against the cache rather than through the parser so
            // a `default_cluster` name containing range-syntax metacharacters
            // can't be misinterpreted as part of a query.
            let mut result = RangeResult::new();
            cluster_key_lookup(state, config, &ctx.child(), &config.default_cluster, KEYS_KEY, &mut result)?;
            result
        }
    };

    let mut result = RangeResult::new();
    for v in candidates.iter() {
        if re.is_match(v) {
            if let AddOutcome::Capped = result.try_add(config, v)? {
                break;
            }
        }
    }
    Ok(result)
}

fn eval_operator(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    kind: OperatorKind,
    left: &AstNode,
    right: &AstNode,
) -> Result<RangeResult, RangeError> {
    match kind {
        OperatorKind::Union => {
            // Left-nested comma chains (`a,b,c,...`) would otherwise grow
            // evaluation depth linearly with the number of terms. Depth is
            // a cycle guard, not a breadth limit, so both sides share the
            // caller's context unchanged.
            let mut result = eval_node(state, config, ctx, left)?;
            let right_result = eval_node(state, config, ctx, right)?;
            result.merge_from(config, &right_result)?;
            Ok(result)
        }
        OperatorKind::Intersect | OperatorKind::Subtract => {
            let left_result = eval_node(state, config, &ctx.child(), left)?;
            if left_result.is_empty() {
                return Ok(RangeResult::new());
            }
            let right_ctx = ctx.child_with_working_set(left_result.clone());
            let right_result = eval_node(state, config, &right_ctx, right)?;

            let combined = if kind == OperatorKind::Intersect {
                left_result.intersection(&right_result)
            } else {
                left_result.difference(&right_result)
            };

            let mut result = RangeResult::new();
            result.merge_from(config, &combined)?;
            Ok(result)
        }
    }
}

/// Brace expansion: an empty side substitutes a single empty string rather
/// than contributing nothing, so `{a,b}` alone still produces `a` and `b`.
fn eval_braces(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    middle: &AstNode,
    left: &AstNode,
    right: &AstNode,
) -> Result<RangeResult, RangeError> {
    let left_result = eval_node(state, config, &ctx.child(), left)?;
    let middle_result = eval_node(state, config, &ctx.child(), middle)?;
    let right_result = eval_node(state, config, &ctx.child(), right)?;

    let empty_slot = || vec![String::new()];
    let left_vals = if left_result.is_empty() { empty_slot() } else { left_result.to_vec() };
    let middle_vals = if middle_result.is_empty() {
        empty_slot()
    } else {
        middle_result.to_vec()
    };
    let right_vals = if right_result.is_empty() {
        empty_slot()
    } else {
        right_result.to_vec()
    };

    let mut result = RangeResult::new();
    'outer: for l in &left_vals {
        for m in &middle_vals {
            for r in &right_vals {
                let combined = format!("{}{}{}", l, m, r);
                if let AddOutcome::Capped = result.try_add(config, &combined)? {
                    break 'outer;
                }
            }
        }
    }
    Ok(result)
}

fn eval_cluster_lookup(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    cluster_expr: &AstNode,
    key_expr: &AstNode,
) -> Result<RangeResult, RangeError> {
    let cluster_names = eval_node(state, config, &ctx.child(), cluster_expr)?;
    let keys = eval_node(state, config, &ctx.child(), key_expr)?;

    let mut result = RangeResult::new();
    'outer: for cluster_name in cluster_names.iter() {
        for key in keys.iter() {
            cluster_key_lookup(state, config, ctx, cluster_name, key, &mut result)?;
            if result.len() >= config.max_results {
                break 'outer;
            }
        }
    }
    Ok(result)
}

/// Cluster key lookup procedure, shared by local (`$KEY`) and explicit
/// (`@cluster:KEY`) lookups. `KEYS` is synthesized from the cluster's stored
/// key names; any other key consults the cache before falling back to
/// evaluating the cluster's stored expressions under a sub-context whose
/// current cluster is `cluster_name`. A missing cluster or key yields an
/// empty contribution, not an error.
fn cluster_key_lookup(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    cluster_name: &str,
    key: &str,
    result: &mut RangeResult,
) -> Result<(), RangeError> {
    if key == KEYS_KEY {
        if let Some(cluster) = state.get_cluster(cluster_name) {
            let mut names: Vec<&String> = cluster.keys().collect();
            names.sort();
            for k in names {
                if let AddOutcome::Capped = result.try_add(config, k)? {
                    break;
                }
            }
        }
        return Ok(());
    }

    if let Some(cached) = state.cache_get(cluster_name, key) {
        let cached = cached.clone();
        for v in &cached {
            if let AddOutcome::Capped = result.try_add(config, v)? {
                break;
            }
        }
        return Ok(());
    }

    let Some(cluster) = state.get_cluster(cluster_name).cloned() else {
        return Ok(());
    };
    let exprs = cluster.get(key).cloned().unwrap_or_default();

    let sub_ctx = ctx.child_with_cluster(cluster_name);
    let mut sub_result = RangeResult::new();
    for expr in &exprs {
        let ast = parser::parse(expr)?;
        let r = eval_node(state, config, &sub_ctx, &ast)?;
        sub_result.merge_from(config, &r)?;
    }

    state.cache_put(cluster_name, key, sub_result.to_vec());

    for v in sub_result.iter() {
        if let AddOutcome::Capped = result.try_add(config, v)? {
            break;
        }
    }
    Ok(())
}

/// Group query: reports the keys of the default cluster whose own
/// expansion intersects the operand.
fn eval_group_query(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    inner: &AstNode,
) -> Result<RangeResult, RangeError> {
    let looking_for = eval_node(state, config, &ctx.child(), inner)?;

    let mut result = RangeResult::new();
    let Some(cluster) = state.get_cluster(&config.default_cluster).cloned() else {
        return Ok(result);
    };

    let mut group_names: Vec<&String> = cluster.keys().collect();
    group_names.sort();

    for group_name in group_names {
        let exprs = cluster.get(group_name).cloned().unwrap_or_default();
        let group_ctx = ctx.child();
        let mut group_result = RangeResult::new();
        for expr in &exprs {
            let ast = parser::parse(expr)?;
            let r = eval_node(state, config, &group_ctx, &ast)?;
            group_result.merge_from(config, &r)?;
        }

        if looking_for.iter().any(|v| group_result.contains(v)) {
            if let AddOutcome::Capped = result.try_add(config, group_name)? {
                break;
            }
        }
    }

    Ok(result)
}

fn eval_function(
    state: &mut RangeState,
    config: &RangeConfig,
    ctx: &EvalContext,
    name: &str,
    args: &[AstNode],
) -> Result<RangeResult, RangeError> {
    match name {
        "allclusters" => {
            check_arity(name, args, 0)?;
            let mut result = RangeResult::new();
            let mut names: Vec<&String> = state.cluster_names().collect();
            names.sort();
            for n in names {
                if let AddOutcome::Capped = result.try_add(config, n)? {
                    break;
                }
            }
            Ok(result)
        }
        "count" => {
            check_arity(name, args, 1)?;
            let inner = eval_node(state, config, &ctx.child(), &args[0])?;
            let mut result = RangeResult::new();
            result.try_add(config, &inner.len().to_string())?;
            Ok(result)
        }
        "has" => {
            check_arity(name, args, 2)?;
            let key_set = eval_node(state, config, &ctx.child(), &args[0])?;
            let value_set = eval_node(state, config, &ctx.child(), &args[1])?;

            let mut result = RangeResult::new();
            // Only the first evaluated value of K is consulted; see
            // `DESIGN.md`'s "has(K;V) first-value" entry.
            let Some(key) = key_set.first().cloned() else {
                return Ok(result);
            };

            let mut cluster_names: Vec<String> = state.cluster_names().cloned().collect();
            cluster_names.sort();
            for cluster_name in cluster_names {
                let mut sub_result = RangeResult::new();
                cluster_key_lookup(state, config, ctx, &cluster_name, &key, &mut sub_result)?;
                if sub_result.intersects(&value_set) {
                    if let AddOutcome::Capped = result.try_add(config, &cluster_name)? {
                        break;
                    }
                }
            }
            Ok(result)
        }
        "clusters" => {
            check_arity(name, args, 1)?;
            let looking_for = eval_node(state, config, &ctx.child(), &args[0])?;

            let mut result = RangeResult::new();
            let mut cluster_names: Vec<String> = state.cluster_names().cloned().collect();
            cluster_names.sort();
            for cluster_name in cluster_names {
                let mut sub_result = RangeResult::new();
                cluster_key_lookup(state, config, ctx, &cluster_name, CLUSTER_KEY, &mut sub_result)?;
                if sub_result.intersects(&looking_for) {
                    if let AddOutcome::Capped = result.try_add(config, &cluster_name)? {
                        break;
                    }
                }
            }
            Ok(result)
        }
        other => Err(RangeError::UnknownFunction {
            name: other.to_string(),
        }),
    }
}

fn check_arity(name: &str, args: &[AstNode], expected: usize) -> Result<(), RangeError> {
    if args.len() != expected {
        Err(RangeError::ArityMismatch {
            name: name.to_string(),
            expected,
            got: args.len(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::state::Cluster;

    fn cluster_from(pairs: &[(&str, &[&str])]) -> Cluster {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn expands_simple_numeric_range() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "host1..3").unwrap();
        let mut got: Vec<&String> = result.iter().collect();
        got.sort();
        assert_eq!(got, vec!["host1", "host2", "host3"]);
    }

    #[test]
    fn zero_pads_from_the_wider_operand() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "host08..10").unwrap();
        let mut got: Vec<&String> = result.iter().collect();
        got.sort();
        assert_eq!(got, vec!["host08", "host09", "host10"]);
    }

    #[test]
    fn mismatched_prefix_emits_verbatim_without_expanding() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "a1..b4").unwrap();
        assert_eq!(result.to_vec(), vec!["a1..b4".to_string()]);
    }

    #[test]
    fn union_merges_both_sides() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "a,b").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn wide_union_does_not_hit_the_depth_limit() {
        let mut state = RangeState::new();
        let config = RangeConfig {
            max_query_depth: 20,
            ..RangeConfig::default()
        };
        let terms: Vec<String> = (0..200).map(|i| format!("host{}", i)).collect();
        let query_str = terms.join(",");
        let result = query(&mut state, &config, &query_str).unwrap();
        assert_eq!(result.len(), 200);
    }

    #[test]
    fn intersect_short_circuits_on_empty_left() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        // `nope` has no cluster default so the default expansion is empty.
        let result = query(&mut state, &config, "%nope&%also-nope").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn cluster_lookup_resolves_cluster_key() {
        let mut state = RangeState::new();
        state.add_cluster(
            "dc1",
            cluster_from(&[("CLUSTER", &["host1", "host2"]), ("TYPE", &["web"])]),
        );
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "%dc1").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["host1".to_string(), "host2".to_string()]);
    }

    #[test]
    fn cluster_lookup_caches_expansions() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("CLUSTER", &["host1"])]));
        let config = RangeConfig::default();
        query(&mut state, &config, "%dc1").unwrap();
        assert!(state.cache_get("dc1", "CLUSTER").is_some());
    }

    #[test]
    fn keys_lists_cluster_key_names() {
        let mut state = RangeState::new();
        state.add_cluster(
            "dc1",
            cluster_from(&[("CLUSTER", &["host1"]), ("TYPE", &["web"])]),
        );
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "%dc1:KEYS").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["CLUSTER".to_string(), "TYPE".to_string()]);
    }

    #[test]
    fn unknown_cluster_yields_empty_not_error() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "%ghost").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn at_lookup_resolves_default_cluster_groups() {
        let mut state = RangeState::new();
        state.add_cluster("GROUPS", cluster_from(&[("web", &["host1", "host2"])]));
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "@web").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["host1".to_string(), "host2".to_string()]);
    }

    #[test]
    fn group_query_finds_owning_groups() {
        let mut state = RangeState::new();
        state.add_cluster(
            "GROUPS",
            cluster_from(&[("web", &["host1", "host2"]), ("db", &["host3"])]),
        );
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "?host1").unwrap();
        assert_eq!(result.to_vec(), vec!["web".to_string()]);
    }

    #[test]
    fn braces_with_empty_sides_still_expand() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "{a,b}").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn braces_concatenate_prefix_and_suffix() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "web{1,2}.example.com").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(
            got,
            vec!["web1.example.com".to_string(), "web2.example.com".to_string()]
        );
    }

    #[test]
    fn regex_filters_a_working_set_instead_of_every_cluster() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "{web1,web2,db1}&/web/").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["web1".to_string(), "web2".to_string()]);
    }

    #[test]
    fn bare_regex_with_no_working_set_filters_default_cluster_keys() {
        let mut state = RangeState::new();
        state.add_cluster(
            "GROUPS",
            cluster_from(&[("WEB", &["web1", "web2"]), ("DB", &["db1"])]),
        );
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "/WEB/").unwrap();
        assert_eq!(result.to_vec(), vec!["WEB".to_string()]);
    }

    #[test]
    fn bare_regex_with_a_default_cluster_name_containing_metacharacters_does_not_panic() {
        let mut state = RangeState::new();
        state.set_default_cluster("{oops}");
        state.add_cluster("{oops}", cluster_from(&[("WEB", &["web1"])]));
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "/WEB/").unwrap();
        assert_eq!(result.to_vec(), vec!["WEB".to_string()]);
    }

    #[test]
    fn count_reports_cardinality() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "count(host1..5)").unwrap();
        assert_eq!(result.to_vec(), vec!["5".to_string()]);
    }

    #[test]
    fn allclusters_lists_registered_clusters() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", Cluster::new());
        state.add_cluster("dc2", Cluster::new());
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "allclusters()").unwrap();
        let mut got = result.to_vec();
        got.sort();
        assert_eq!(got, vec!["dc1".to_string(), "dc2".to_string()]);
    }

    #[test]
    fn has_finds_clusters_with_matching_key_value() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("TYPE", &["web"])]));
        state.add_cluster("dc2", cluster_from(&[("TYPE", &["db"])]));
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "has(TYPE;web)").unwrap();
        assert_eq!(result.to_vec(), vec!["dc1".to_string()]);
    }

    #[test]
    fn clusters_finds_clusters_owning_a_host() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("CLUSTER", &["host1"])]));
        state.add_cluster("dc2", cluster_from(&[("CLUSTER", &["host2"])]));
        let config = RangeConfig::default();
        let result = query(&mut state, &config, "clusters(host1)").unwrap();
        assert_eq!(result.to_vec(), vec!["dc1".to_string()]);
    }

    #[test]
    fn prime_cache_populates_every_cluster_key() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("CLUSTER", &["host1", "host2"]), ("TYPE", &["web"])]));
        let config = RangeConfig::default();

        let errors = prime_cache(&mut state, &config);
        assert!(errors.is_empty());

        assert_eq!(
            state.cache_get("dc1", "CLUSTER").unwrap(),
            &vec!["host1".to_string(), "host2".to_string()]
        );
        assert_eq!(state.cache_get("dc1", "TYPE").unwrap(), &vec!["web".to_string()]);
    }

    #[test]
    fn prime_cache_collects_errors_without_aborting_the_walk() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("CLUSTER", &["/unterminated"])]));
        state.add_cluster("dc2", cluster_from(&[("CLUSTER", &["host1"])]));
        let config = RangeConfig::default();

        let errors = prime_cache(&mut state, &config);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            state.cache_get("dc2", "CLUSTER").unwrap(),
            &vec!["host1".to_string()]
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        assert!(query(&mut state, &config, "bogus(a)").is_err());
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let mut state = RangeState::new();
        let config = RangeConfig::default();
        assert!(query(&mut state, &config, "count(a;b)").is_err());
    }

    #[test]
    fn self_referential_cluster_hits_depth_limit_not_a_stack_overflow() {
        let mut state = RangeState::new();
        state.add_cluster("dc1", cluster_from(&[("CLUSTER", &["%dc1"])]));
        let config = RangeConfig {
            max_query_depth: 20,
            ..RangeConfig::default()
        };
        assert!(matches!(
            query(&mut state, &config, "%dc1"),
            Err(RangeError::DepthExceeded)
        ));
    }

    #[test]
    fn oversized_query_is_rejected_upfront() {
        let mut state = RangeState::new();
        let config = RangeConfig {
            max_query_size: 4,
            ..RangeConfig::default()
        };
        assert!(query(&mut state, &config, "toolong").is_err());
    }
}

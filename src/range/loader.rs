//! Reads a directory of YAML cluster files into a [`RangeState`].
//!
//! On-disk cluster storage is deliberately left outside the core catalog
//! type; this loader exists so the CLI front end has something runnable to
//! point `--clusters` at.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use super::state::{Cluster, RangeState};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("reading cluster directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing cluster file {path}: {source}")]
    InvalidYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate cluster name {name:?} (from {first} and {second})")]
    DuplicateCluster {
        name: String,
        first: String,
        second: String,
    },
}

/// Loads every `*.yaml`/`*.yml` file directly under `dir` into a fresh
/// [`RangeState`]. Each file's stem (case-preserved) becomes a cluster
/// name; each file's top-level YAML keys are uppercased to become that
/// cluster's keys.
pub fn load_clusters_dir(dir: &Path) -> Result<RangeState, LoaderError> {
    let mut state = RangeState::new();
    let mut seen: BTreeMap<String, String> = BTreeMap::new();

    let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut paths: Vec<std::path::PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_yaml_file(p))
        .collect();
    paths.sort();

    for path in paths {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        if let Some(first) = seen.get(&name) {
            return Err(LoaderError::DuplicateCluster {
                name,
                first: first.clone(),
                second: path.display().to_string(),
            });
        }

        let cluster = load_cluster_file(&path)?;
        seen.insert(name.clone(), path.display().to_string());
        state.add_cluster(name, cluster);
    }

    Ok(state)
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn load_cluster_file(path: &Path) -> Result<Cluster, LoaderError> {
    let contents = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let raw: BTreeMap<String, Vec<String>> =
        serde_yaml::from_str(&contents).map_err(|source| LoaderError::InvalidYaml {
            path: path.display().to_string(),
            source,
        })?;

    Ok(raw
        .into_iter()
        .map(|(key, values)| (key.to_uppercase(), values))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_cluster_file_and_uppercases_keys() {
        let dir = tempdir();
        let mut f = std::fs::File::create(dir.join("dc1.yaml")).unwrap();
        writeln!(f, "cluster:\n  - host1\n  - host2\ntype:\n  - web").unwrap();

        let state = load_clusters_dir(&dir).unwrap();
        let cluster = state.get_cluster("dc1").expect("dc1 registered");
        assert_eq!(cluster.get("CLUSTER").unwrap(), &vec!["host1".to_string(), "host2".to_string()]);
        assert_eq!(cluster.get("TYPE").unwrap(), &vec!["web".to_string()]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn duplicate_stems_are_rejected() {
        let dir = tempdir();
        std::fs::write(dir.join("dc1.yaml"), "cluster: []\n").unwrap();
        std::fs::write(dir.join("dc1.yml"), "cluster: []\n").unwrap();

        let err = load_clusters_dir(&dir).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateCluster { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let dir = tempdir();
        std::fs::write(dir.join("dc1.yaml"), "not: [valid: yaml\n").unwrap();

        let err = load_clusters_dir(&dir).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidYaml { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rangefan-loader-test-{:?}",
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

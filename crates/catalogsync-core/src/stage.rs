//! Stage map and storage-location resolution
//!
//! A stage is a warehouse-side name for an object-storage prefix. External
//! tables reference their data through a stage instead of a literal URI, so
//! every table location has to be rewritten as `<stage>/<remaining path>`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::ConfigError;

/// Mapping from stage name to the storage prefix it was registered at
///
/// Paths are stored without trailing slashes. No two stages may share a
/// path: the resolver would have no way to choose between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct StageMap {
    stages: BTreeMap<String, String>,
    by_path: HashMap<String, String>,
}

impl StageMap {
    /// Build a stage map, normalizing paths and rejecting ambiguous entries
    pub fn new<I, K, V>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut stages = BTreeMap::new();
        let mut by_path: HashMap<String, String> = HashMap::new();

        for (name, path) in entries {
            let name = name.into();
            let path = path.as_ref().trim_end_matches('/').to_string();

            if name.is_empty() || path.is_empty() {
                return Err(ConfigError::InvalidStage {
                    stage: name,
                    reason: "stage name and path must be non-empty".to_string(),
                });
            }

            if let Some(existing) = by_path.get(&path) {
                return Err(ConfigError::AmbiguousStage {
                    path,
                    first: existing.clone(),
                    second: name,
                });
            }

            by_path.insert(path.clone(), name.clone());
            stages.insert(name, path);
        }

        Ok(Self { stages, by_path })
    }

    /// Resolve a storage location to a stage-relative path
    ///
    /// The longest registered prefix of `location` (compared segment-wise on
    /// `/`) wins. The result is the stage name followed by the unmatched
    /// trailing segments; empty segments left by trailing slashes are
    /// dropped. Returns `None` when no registered prefix matches.
    pub fn resolve(&self, location: &str) -> Option<String> {
        let segments: Vec<&str> = location.split('/').collect();

        for end in (1..=segments.len()).rev() {
            let candidate = segments[..end].join("/");
            if let Some(stage) = self.by_path.get(&candidate) {
                let mut resolved = vec![stage.as_str()];
                resolved.extend(segments[end..].iter().filter(|s| !s.is_empty()));
                return Some(resolved.join("/"));
            }
        }

        None
    }

    /// Registered path for a stage
    pub fn path(&self, stage: &str) -> Option<&str> {
        self.stages.get(stage).map(String::as_str)
    }

    /// Iterate `(stage, path)` pairs in stage-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stages.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for StageMap {
    type Error = ConfigError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<StageMap> for BTreeMap<String, String> {
    fn from(map: StageMap) -> Self {
        map.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stages() -> StageMap {
        StageMap::new([
            ("lake_stage", "s3://bucket/lake/"),
            ("orders_stage", "s3://bucket/lake/orders"),
        ])
        .unwrap()
    }

    #[test]
    fn exact_match_returns_bare_stage() {
        assert_eq!(stages().resolve("s3://bucket/lake/orders/"), Some("orders_stage".to_string()));
        assert_eq!(stages().resolve("s3://bucket/lake/orders"), Some("orders_stage".to_string()));
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(
            stages().resolve("s3://bucket/lake/orders/2024/"),
            Some("orders_stage/2024".to_string())
        );
        assert_eq!(
            stages().resolve("s3://bucket/lake/customers/v2/"),
            Some("lake_stage/customers/v2".to_string())
        );
    }

    #[test]
    fn prefix_must_match_whole_segments() {
        assert_eq!(stages().resolve("s3://bucket/lake/orders_archive/"), Some("lake_stage/orders_archive".to_string()));
        assert_eq!(stages().resolve("s3://bucket/lakehouse/orders/"), None);
    }

    #[test]
    fn unresolved_location() {
        assert_eq!(stages().resolve("s3://other-bucket/orders/"), None);
        assert_eq!(StageMap::default().resolve("s3://bucket/lake/"), None);
    }

    #[test]
    fn duplicate_paths_are_ambiguous() {
        let result = StageMap::new([("a", "s3://bucket/x/"), ("b", "s3://bucket/x")]);
        assert!(matches!(result, Err(ConfigError::AmbiguousStage { .. })));
    }

    #[test]
    fn empty_path_rejected() {
        let result = StageMap::new([("root", "/")]);
        assert!(matches!(result, Err(ConfigError::InvalidStage { .. })));
    }

    #[test]
    fn deserializes_from_plain_map() {
        let map: StageMap = serde_json::from_str(r#"{"orders_stage": "s3://bucket/orders/"}"#).unwrap();
        assert_eq!(map.path("orders_stage"), Some("s3://bucket/orders"));
        assert_eq!(map.len(), 1);
    }
}

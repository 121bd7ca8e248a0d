/// Tag dictionary loading trait and implementations
///
/// The expansion core never touches the filesystem; it receives an
/// already-built [`TagStore`]. This module provides an async trait for
/// producing stores, with a filesystem implementation that collects YAML
/// files from a tags directory and an in-memory implementation for tests
/// and embedding.
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

#[cfg(feature = "tokio-runtime")]
use async_recursion::async_recursion;
#[cfg(feature = "tokio-runtime")]
use std::path::PathBuf;
#[cfg(feature = "tokio-runtime")]
use tracing::debug;

use crate::tags::{TagStore, TagValue};

/// Error types for tag dictionary loading
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Io(String),
    Yaml { file: String, message: String },
    InvalidPath(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "IO error: {}", msg),
            LoadError::Yaml { file, message } => {
                write!(f, "Invalid YAML in '{}': {}", file, message)
            }
            LoadError::InvalidPath(path) => write!(f, "Invalid path: {}", path),
        }
    }
}

impl std::error::Error for LoadError {}

/// Async trait for producing a complete tag store
///
/// Implementations load the whole dictionary in one call; the result
/// replaces any previous store wholesale via
/// [`Selector::reload`](crate::Selector::reload).
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Build a fresh tag store
    async fn load(&self) -> Result<TagStore, LoadError>;
}

/// Filesystem-based tag source
///
/// Recursively collects `*.yml` / `*.yaml` files under a base directory;
/// each file's stem becomes a top-level tag name and its parsed contents
/// become that tag's value tree. Files are visited in sorted path order
/// so the store's top-level iteration order is stable across loads.
///
/// Only available with the `tokio-runtime` feature (not on WASM).
#[cfg(feature = "tokio-runtime")]
pub struct FolderTagSource {
    base_path: PathBuf,
}

#[cfg(feature = "tokio-runtime")]
impl FolderTagSource {
    /// Create a new FolderTagSource over the given tags directory
    ///
    /// # Example
    /// ```no_run
    /// use prompt_selector::loader::FolderTagSource;
    /// use std::path::PathBuf;
    ///
    /// let source = FolderTagSource::new(PathBuf::from("./tags"));
    /// ```
    pub fn new(base_path: PathBuf) -> Self {
        FolderTagSource { base_path }
    }
}

#[cfg(feature = "tokio-runtime")]
#[async_trait]
impl TagSource for FolderTagSource {
    async fn load(&self) -> Result<TagStore, LoadError> {
        let mut files = Vec::new();
        collect_tag_files(self.base_path.clone(), &mut files).await?;
        files.sort();

        let mut store = TagStore::new();
        for path in files {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| LoadError::InvalidPath(path.display().to_string()))?;

            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| LoadError::Io(e.to_string()))?;
            let value: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(|e| LoadError::Yaml {
                    file: path.display().to_string(),
                    message: e.to_string(),
                })?;

            debug!(file = %path.display(), tag = %name, "loaded tag file");
            store.insert(name, tag_value_from_yaml(value));
        }
        Ok(store)
    }
}

#[cfg(feature = "tokio-runtime")]
#[async_recursion]
async fn collect_tag_files(dir: PathBuf, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| LoadError::Io(e.to_string()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LoadError::Io(e.to_string()))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| LoadError::Io(e.to_string()))?;
        if file_type.is_dir() {
            collect_tag_files(path, files).await?;
        } else if matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yml" | "yaml")
        ) {
            files.push(path);
        }
    }
    Ok(())
}

/// Convert a parsed YAML document into a tag value tree.
///
/// Mapping order is preserved. Non-string scalars stringify; nulls become
/// empty-string options.
pub fn tag_value_from_yaml(value: serde_yaml::Value) -> TagValue {
    use serde_yaml::Value;
    match value {
        Value::Null => TagValue::Scalar(String::new()),
        Value::Bool(b) => TagValue::Scalar(b.to_string()),
        Value::Number(n) => TagValue::Scalar(n.to_string()),
        Value::String(s) => TagValue::Scalar(s),
        Value::Sequence(items) => {
            TagValue::List(items.into_iter().map(tag_value_from_yaml).collect())
        }
        Value::Mapping(mapping) => {
            let mut map = IndexMap::new();
            for (key, value) in mapping {
                let key = match key {
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                map.insert(key, tag_value_from_yaml(value));
            }
            TagValue::Map(map)
        }
        Value::Tagged(tagged) => tag_value_from_yaml(tagged.value),
    }
}

/// In-memory tag source
///
/// Holds top-level tags directly, useful for testing and for embedding a
/// dictionary in the host application.
#[derive(Clone, Default)]
pub struct MemoryTagSource {
    tags: Arc<RwLock<IndexMap<String, TagValue>>>,
}

impl MemoryTagSource {
    /// Create a new empty MemoryTagSource
    pub fn new() -> Self {
        MemoryTagSource {
            tags: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    /// Add a top-level tag, replacing any previous value under that name
    pub fn add(&self, name: impl Into<String>, value: TagValue) {
        let mut tags = self.tags.write().unwrap();
        tags.insert(name.into(), value);
    }

    /// Add a top-level tag parsed from YAML source
    pub fn add_yaml(&self, name: impl Into<String>, source: &str) -> Result<(), LoadError> {
        let name = name.into();
        let value: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(|e| LoadError::Yaml {
                file: name.clone(),
                message: e.to_string(),
            })?;
        self.add(name, tag_value_from_yaml(value));
        Ok(())
    }

    /// Remove a top-level tag, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        let mut tags = self.tags.write().unwrap();
        tags.shift_remove(name).is_some()
    }

    /// Check whether a top-level tag exists
    pub fn contains(&self, name: &str) -> bool {
        let tags = self.tags.read().unwrap();
        tags.contains_key(name)
    }

    /// Remove all tags
    pub fn clear(&self) {
        let mut tags = self.tags.write().unwrap();
        tags.clear();
    }
}

#[async_trait]
impl TagSource for MemoryTagSource {
    async fn load(&self) -> Result<TagStore, LoadError> {
        let tags = self.tags.read().unwrap();
        Ok(tags
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_scalars_stringify() {
        let value: serde_yaml::Value = serde_yaml::from_str("[red, 5, true, null]").unwrap();
        let tag = tag_value_from_yaml(value);
        assert_eq!(tag.flatten(), vec!["red", "5", "true", ""]);
    }

    #[test]
    fn test_yaml_mapping_preserves_order() {
        let value: serde_yaml::Value =
            serde_yaml::from_str("zebra: [a]\napple: [b]\nmango: [c]").unwrap();
        let tag = tag_value_from_yaml(value);
        assert_eq!(tag.flatten(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_yaml_nested_mapping() {
        let source = "formal:\n  - suit\n  - tuxedo\ncasual: jeans\n";
        let value: serde_yaml::Value = serde_yaml::from_str(source).unwrap();
        let tag = tag_value_from_yaml(value);
        match &tag {
            TagValue::Map(map) => {
                assert_eq!(map.len(), 2);
                assert!(map.contains_key("formal"));
            }
            other => panic!("expected map, got {:?}", other),
        }
        assert_eq!(tag.flatten(), vec!["suit", "tuxedo", "jeans"]);
    }

    #[tokio::test]
    async fn test_memory_source_basic() {
        let source = MemoryTagSource::new();
        source.add("color", TagValue::Scalar("red".to_string()));

        let store = source.load().await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("color"),
            Some(&TagValue::Scalar("red".to_string()))
        );
    }

    #[tokio::test]
    async fn test_memory_source_add_yaml() {
        let source = MemoryTagSource::new();
        source.add_yaml("color", "- red\n- blue\n").unwrap();
        assert!(source.contains("color"));

        let store = source.load().await.unwrap();
        let value = store.get("color").unwrap();
        assert_eq!(value.flatten(), vec!["red", "blue"]);
    }

    #[tokio::test]
    async fn test_memory_source_invalid_yaml() {
        let source = MemoryTagSource::new();
        let result = source.add_yaml("broken", "{unclosed");
        assert!(matches!(result, Err(LoadError::Yaml { .. })));
    }

    #[tokio::test]
    async fn test_memory_source_remove_and_clear() {
        let source = MemoryTagSource::new();
        source.add("a", TagValue::Scalar("1".to_string()));
        source.add("b", TagValue::Scalar("2".to_string()));

        assert!(source.remove("a"));
        assert!(!source.remove("a"));
        assert!(source.contains("b"));

        source.clear();
        assert!(!source.contains("b"));
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_folder_source_missing_directory() {
        let source = FolderTagSource::new(PathBuf::from("/nonexistent/tags"));
        let result = source.load().await;
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}

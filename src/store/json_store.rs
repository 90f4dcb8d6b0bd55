use anyhow::{anyhow, Context};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::paths::PathResolver;
use crate::records::Record;

/// How mutating operations on the same collection are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteAccess {
    /// Load, mutate and save without coordination. Two writers racing on one
    /// collection can lose an update (last writer wins).
    #[default]
    Unsynchronized,
    /// One mutation at a time per collection.
    Serialized,
}

/// Whole-file JSON array store. Every call reads from disk; nothing is cached.
#[derive(Debug)]
pub struct RecordStore {
    paths: PathResolver,
    access: WriteAccess,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RecordStore {
    pub fn new(paths: PathResolver, access: WriteAccess) -> Self {
        Self {
            paths,
            access,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    pub fn access(&self) -> WriteAccess {
        self.access
    }

    /// Returns the collection file path, creating it as `[]` when absent.
    pub fn ensure(&self, collection: &str) -> anyhow::Result<PathBuf> {
        validate_name(collection)?;
        let path = self.paths.resolve(collection);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
        }
        if path.exists() {
            return Ok(path);
        }

        // Link a fully written `[]` into place so readers never see an empty file.
        let tmp = tmp_path(&path);
        std::fs::write(&tmp, b"[]")
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        let linked = std::fs::hard_link(&tmp, &path);
        let _ = std::fs::remove_file(&tmp);
        match linked {
            Ok(()) => {
                tracing::debug!(collection, path = %path.display(), "initialised empty collection");
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| format!("failed to create {}", path.to_string_lossy()))
            }
        }
        Ok(path)
    }

    pub fn load(&self, collection: &str) -> anyhow::Result<Vec<Record>> {
        let path = self.ensure(collection)?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON array of objects", path.to_string_lossy()))
    }

    /// Replaces the whole collection file with `records`, pretty-printed with 2-space indent.
    pub fn save(&self, collection: &str, records: &[Record]) -> anyhow::Result<()> {
        validate_name(collection)?;
        let text = serde_json::to_string_pretty(records)
            .with_context(|| format!("failed to serialize collection {collection}"))?;
        self.write_raw(collection, text.as_bytes())
    }

    /// Writes raw bytes as the collection file through a sibling temp file.
    pub fn write_raw(&self, collection: &str, bytes: &[u8]) -> anyhow::Result<()> {
        validate_name(collection)?;
        let path = self.paths.resolve(collection);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
        }
        let tmp = tmp_path(&path);
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        std::fs::rename(&tmp, &path).with_context(|| {
            format!(
                "failed to move {} to {}",
                tmp.to_string_lossy(),
                path.to_string_lossy()
            )
        })
    }

    /// Load, mutate, save. Nothing is written when `f` fails or returns `None`.
    pub fn modify<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut Vec<Record>) -> anyhow::Result<Option<T>>,
    ) -> anyhow::Result<Option<T>> {
        let lock = match self.access {
            WriteAccess::Unsynchronized => None,
            WriteAccess::Serialized => Some(self.collection_lock(collection)),
        };
        let _guard = lock
            .as_ref()
            .map(|l| l.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));

        let mut records = self.load(collection)?;
        let Some(out) = f(&mut records)? else {
            return Ok(None);
        };
        self.save(collection, &records)?;
        Ok(Some(out))
    }

    fn collection_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn validate_name(collection: &str) -> anyhow::Result<()> {
    let ok = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(anyhow!("invalid collection name: {collection:?}"))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.writing", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

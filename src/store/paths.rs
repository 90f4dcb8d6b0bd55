use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageRoot {
    /// Served as static files next to the dashboard.
    Public,
    Data,
}

impl StorageRoot {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageRoot::Public => "public",
            StorageRoot::Data => "data",
        }
    }
}

/// Maps collection names to their JSON file. Names not in the public table live under the data root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    data_dir: PathBuf,
    public_dir: PathBuf,
    public_collections: BTreeSet<String>,
}

impl PathResolver {
    pub fn new<I, S>(data_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>, public: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_dir: data_dir.into(),
            public_dir: public_dir.into(),
            public_collections: public.into_iter().map(Into::into).collect(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn root_of(&self, collection: &str) -> StorageRoot {
        if self.public_collections.contains(collection) {
            StorageRoot::Public
        } else {
            StorageRoot::Data
        }
    }

    pub fn resolve(&self, collection: &str) -> PathBuf {
        let dir = match self.root_of(collection) {
            StorageRoot::Public => &self.public_dir,
            StorageRoot::Data => &self.data_dir,
        };
        dir.join(format!("{collection}.json"))
    }
}

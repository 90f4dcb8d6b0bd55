use anyhow::Context;
use std::env;
use std::path::PathBuf;

use crate::collections::ELEVES;
use crate::matricule::MatriculePolicy;
use crate::store::{PathResolver, WriteAccess};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub public_collections: Vec<String>,
    pub matricule: MatriculePolicy,
    pub write_access: WriteAccess,
    /// `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            data_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public"),
            public_collections: vec![ELEVES.to_string()],
            matricule: MatriculePolicy::default(),
            write_access: WriteAccess::default(),
            cors_allowed_origins: vec!["*".to_string()],
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Builds the configuration from `LYCEE_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let policy_name = env::var("LYCEE_MATRICULE_POLICY").unwrap_or_default();
        let prefix = env::var("LYCEE_MATRICULE_PREFIX").ok();
        let matricule = MatriculePolicy::parse(&policy_name, prefix.as_deref())
            .context("invalid LYCEE_MATRICULE_POLICY")?;

        Ok(Self {
            bind_addr: env::var("LYCEE_BIND").unwrap_or(defaults.bind_addr),
            data_dir: env::var("LYCEE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            public_dir: env::var("LYCEE_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            public_collections: env_list("LYCEE_PUBLIC_COLLECTIONS")
                .unwrap_or(defaults.public_collections),
            matricule,
            write_access: if env_bool("LYCEE_SERIALIZE_WRITES", false) {
                WriteAccess::Serialized
            } else {
                WriteAccess::Unsynchronized
            },
            cors_allowed_origins: env_list("LYCEE_CORS_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
            max_body_bytes: env_usize("LYCEE_MAX_BODY_BYTES", defaults.max_body_bytes),
            log_json: env_bool("LYCEE_LOG_JSON", defaults.log_json),
        })
    }

    /// Same settings, rooted under `workspace/data` and `workspace/public`.
    pub fn rooted_at(&self, workspace: &std::path::Path) -> Self {
        Self {
            data_dir: workspace.join("data"),
            public_dir: workspace.join("public"),
            ..self.clone()
        }
    }

    pub fn path_resolver(&self) -> PathResolver {
        PathResolver::new(
            self.data_dir.clone(),
            self.public_dir.clone(),
            self.public_collections.iter().cloned(),
        )
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = env::var(name).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

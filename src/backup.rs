use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::records::{now_timestamp, Record};
use crate::service::DataService;

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "lycee-data-v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    pub format: String,
    pub version: u32,
    pub app_version: String,
    pub exported_at: String,
    pub collections: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub name: String,
    pub root: String,
    pub entry: String,
    pub records: usize,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub collections_restored: Vec<String>,
}

fn entry_name(collection: &str) -> String {
    format!("collections/{collection}.json")
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes every registered collection into a zip bundle at `out_path`.
pub fn export_bundle(service: &DataService, out_path: &Path) -> anyhow::Result<ExportSummary> {
    let store = service.store();
    let mut payloads: Vec<(BundleEntry, Vec<u8>)> = Vec::new();
    for spec in service.collections().iter() {
        let path = store.ensure(spec.name)?;
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
        let records: Vec<Record> = serde_json::from_slice(&bytes)
            .with_context(|| format!("{} is not a JSON array of objects", path.to_string_lossy()))?;
        payloads.push((
            BundleEntry {
                name: spec.name.to_string(),
                root: store.paths().root_of(spec.name).as_str().to_string(),
                entry: entry_name(spec.name),
                records: records.len(),
                sha256: sha256_hex(&bytes),
            },
            bytes,
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = BundleManifest {
        format: BUNDLE_FORMAT_V1.to_string(),
        version: 1,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: now_timestamp(),
        collections: payloads.iter().map(|(e, _)| e.clone()).collect(),
    };
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for (entry, bytes) in &payloads {
        zip.start_file(entry.entry.as_str(), opts)
            .with_context(|| format!("failed to start entry {}", entry.entry))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {}", entry.entry))?;
    }

    zip.finish().context("failed to finalize zip bundle")?;
    tracing::info!(out = %out_path.display(), collections = payloads.len(), "backup exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: payloads.len() + 1,
    })
}

/// Restores collections from a bundle. Every entry is checked before any file is replaced.
pub fn import_bundle(in_path: &Path, service: &DataService) -> anyhow::Result<ImportSummary> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: BundleManifest =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid")?;
    if manifest.format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", manifest.format));
    }

    let mut staged: Vec<(String, Vec<u8>)> = Vec::new();
    for entry in &manifest.collections {
        if service.collection(&entry.name).is_none() {
            return Err(anyhow!("bundle contains unknown collection: {}", entry.name));
        }
        let mut bytes = Vec::new();
        archive
            .by_name(&entry.entry)
            .with_context(|| format!("bundle missing {}", entry.entry))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read {}", entry.entry))?;
        let digest = sha256_hex(&bytes);
        if digest != entry.sha256 {
            return Err(anyhow!(
                "checksum mismatch for {}: expected {}, got {}",
                entry.entry,
                entry.sha256,
                digest
            ));
        }
        serde_json::from_slice::<Vec<Record>>(&bytes)
            .with_context(|| format!("{} is not a JSON array of objects", entry.entry))?;
        staged.push((entry.name.clone(), bytes));
    }

    let store = service.store();
    for (name, bytes) in &staged {
        store.write_raw(name, bytes)?;
    }
    tracing::info!(bundle = %in_path.display(), collections = staged.len(), "backup imported");

    Ok(ImportSummary {
        bundle_format_detected: manifest.format,
        collections_restored: staged.into_iter().map(|(n, _)| n).collect(),
    })
}

use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn required_path(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        _ => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out = match required_path(req, "outPath") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match backup::export_bundle(&state.service, &out) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "ok": true,
                "path": out.to_string_lossy(),
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
            }),
        ),
        Err(e) => err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": out.to_string_lossy() })),
        ),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let src = match required_path(req, "inPath") {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": src.to_string_lossy() })),
        );
    }
    match backup::import_bundle(&src, &state.service) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "ok": true,
                "bundleFormatDetected": summary.bundle_format_detected,
                "collectionsRestored": summary.collections_restored,
            }),
        ),
        Err(e) => err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": src.to_string_lossy() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::service::DataService;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paths = state.service.store().paths();
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataDir": paths.data_dir().to_string_lossy(),
            "publicDir": paths.public_dir().to_string_lossy(),
            "matriculePolicy": state.service.matricule_policy().name(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let config = state.config.rooted_at(&path);
    let service = DataService::from_config(&config);
    // Touch every collection so a bad workspace fails here rather than on first use.
    for spec in service.collections().iter() {
        if let Err(e) = service.store().ensure(spec.name) {
            return err(
                &req.id,
                "store_failed",
                format!("{e:#}"),
                Some(json!({ "path": path.to_string_lossy() })),
            );
        }
    }

    tracing::info!(workspace = %path.display(), "workspace selected");
    state.config = config;
    state.service = Arc::new(service);
    ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
}

fn handle_collections_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let paths = state.service.store().paths();
    let collections: Vec<serde_json::Value> = state
        .service
        .collections()
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "label": spec.label,
                "root": paths.root_of(spec.name).as_str(),
            })
        })
        .collect();
    ok(&req.id, json!({ "collections": collections }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "collections.list" => Some(handle_collections_list(state, req)),
        _ => None,
    }
}

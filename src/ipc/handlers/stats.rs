use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_stats_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.service.stats() {
        Ok(stats) => match serde_json::to_value(&stats) {
            Ok(v) => ok(&req.id, v),
            Err(e) => err(&req.id, "store_failed", e.to_string(), None),
        },
        Err(e) => err(&req.id, "store_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.get" => Some(handle_stats_get(state, req)),
        _ => None,
    }
}

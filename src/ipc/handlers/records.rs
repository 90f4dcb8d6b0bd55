use crate::collections::CollectionSpec;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::records::{parse_id_param, Record};
use serde_json::json;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    fn store(e: anyhow::Error) -> Self {
        HandlerErr {
            code: "store_failed",
            message: format!("{e:#}"),
            details: None,
        }
    }
}

/// Accepts `3` or `"3"`; anything else yields no id and therefore matches no record.
fn param_id(params: &serde_json::Value) -> Result<Option<i64>, HandlerErr> {
    match params.get("id") {
        Some(serde_json::Value::Number(n)) => Ok(n.as_i64()),
        Some(serde_json::Value::String(s)) => Ok(parse_id_param(s)),
        _ => Err(HandlerErr {
            code: "bad_params",
            message: "missing id".to_string(),
            details: None,
        }),
    }
}

fn param_object(params: &serde_json::Value, key: &str) -> Result<Record, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(Record::new()),
        Some(serde_json::Value::Object(m)) => Ok(m.clone()),
        Some(_) => Err(HandlerErr {
            code: "bad_params",
            message: format!("{key} must be an object"),
            details: None,
        }),
    }
}

fn handle_list(state: &AppState, spec: &CollectionSpec) -> Result<serde_json::Value, HandlerErr> {
    let records = state.service.list(spec).map_err(HandlerErr::store)?;
    Ok(json!({ "records": records }))
}

fn handle_create(
    state: &AppState,
    spec: &CollectionSpec,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let input = param_object(&req.params, "record")?;
    let created = state.service.create(spec, input).map_err(HandlerErr::store)?;
    Ok(json!({ "message": created.message, "data": created.record }))
}

fn handle_update(
    state: &AppState,
    spec: &CollectionSpec,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let id = param_id(&req.params)?;
    let patch = param_object(&req.params, "patch")?;
    match state.service.update(spec, id, &patch).map_err(HandlerErr::store)? {
        Some(updated) => Ok(json!({ "message": updated.message, "data": updated.record })),
        None => Err(HandlerErr {
            code: "not_found",
            message: spec.not_found_message(),
            details: Some(json!({ "collection": spec.name, "id": req.params.get("id") })),
        }),
    }
}

fn handle_delete(
    state: &AppState,
    spec: &CollectionSpec,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let id = param_id(&req.params)?;
    let message = state.service.delete(spec, id).map_err(HandlerErr::store)?;
    Ok(json!({ "message": message }))
}

/// Handles `<collection>.list|create|update|delete` for every registered collection.
pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (collection, verb) = req.method.split_once('.')?;
    if !matches!(verb, "list" | "create" | "update" | "delete") {
        return None;
    }
    let Some(spec) = state.service.collection(collection).cloned() else {
        return Some(err(
            &req.id,
            "unknown_collection",
            format!("unknown collection: {collection}"),
            None,
        ));
    };

    let result = match verb {
        "list" => handle_list(state, &spec),
        "create" => handle_create(state, &spec, req),
        "update" => handle_update(state, &spec, req),
        _ => handle_delete(state, &spec, req),
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            if e.code == "store_failed" {
                tracing::warn!(method = %req.method, error = %e.message, "sidecar request failed");
            }
            e.response(&req.id)
        }
    })
}

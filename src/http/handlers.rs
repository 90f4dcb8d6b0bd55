use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::error::ApiError;
use super::HttpState;
use crate::collections::CollectionSpec;
use crate::records::{parse_id_param, Record};
use crate::service::DataService;
use crate::stats::Stats;

async fn run_blocking<T, F>(state: &HttpState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&DataService) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || f(service.as_ref()))
        .await
        .map_err(|e| ApiError::internal(format!("worker failed: {e}")))?
}

fn collection_spec(state: &HttpState, name: &str) -> Result<CollectionSpec, ApiError> {
    state
        .service
        .collection(name)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("collection inconnue: {name}")))
}

/// An empty body is `{}`; anything else must be a JSON object.
fn parse_body(body: &Bytes) -> Result<Record, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(ApiError::bad_request("le corps de la requête doit être un objet JSON")),
        Err(e) => Err(ApiError::bad_request(format!("JSON invalide: {e}"))),
    }
}

pub async fn health_handler(State(state): State<HttpState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "collections": state.service.collections().names(),
    }))
}

pub async fn stats_handler(State(state): State<HttpState>) -> Result<Json<Stats>, ApiError> {
    let stats = run_blocking(&state, |svc| svc.stats().map_err(ApiError::from)).await?;
    Ok(Json(stats))
}

pub async fn list_handler(
    State(state): State<HttpState>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let spec = collection_spec(&state, &collection)?;
    let records = run_blocking(&state, move |svc| svc.list(&spec).map_err(ApiError::from)).await?;
    Ok(Json(records))
}

pub async fn create_handler(
    State(state): State<HttpState>,
    Path(collection): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let spec = collection_spec(&state, &collection)?;
    let input = parse_body(&body)?;
    let created = run_blocking(&state, move |svc| {
        svc.create(&spec, input).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(json!({ "message": created.message, "data": created.record })))
}

pub async fn update_handler(
    State(state): State<HttpState>,
    Path((collection, raw_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let spec = collection_spec(&state, &collection)?;
    let patch = parse_body(&body)?;
    let id = parse_id_param(&raw_id);
    let updated = run_blocking(&state, move |svc| {
        match svc.update(&spec, id, &patch).map_err(ApiError::from)? {
            Some(m) => Ok(m),
            None => Err(ApiError::not_found(spec.not_found_message())),
        }
    })
    .await?;
    Ok(Json(json!({ "message": updated.message, "data": updated.record })))
}

pub async fn delete_handler(
    State(state): State<HttpState>,
    Path((collection, raw_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let spec = collection_spec(&state, &collection)?;
    let id = parse_id_param(&raw_id);
    let message = run_blocking(&state, move |svc| {
        svc.delete(&spec, id).map_err(ApiError::from)
    })
    .await?;
    Ok(Json(json!({ "message": message })))
}

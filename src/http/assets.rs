use std::path::{Component, Path, PathBuf};

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::{HttpState, DASHBOARD_PAGE};

fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Maps a request path onto the public root. Anything that could escape it is refused.
fn public_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = Path::new(request_path.trim_start_matches('/'));
    let mut out = root.to_path_buf();
    for c in rel.components() {
        match c {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

async fn serve_file(path: PathBuf) -> Result<Response, ApiError> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type(&path))],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::not_found("ressource introuvable"))
        }
        Err(e) => Err(ApiError::internal(format!(
            "failed to read {}: {e}",
            path.to_string_lossy()
        ))),
    }
}

pub async fn dashboard_handler(State(state): State<HttpState>) -> Result<Response, ApiError> {
    serve_file(state.public_dir.join(DASHBOARD_PAGE)).await
}

pub async fn static_handler(
    State(state): State<HttpState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::not_found("ressource introuvable"));
    }
    let Some(mut path) = public_file(&state.public_dir, uri.path()) else {
        return Err(ApiError::not_found("ressource introuvable"));
    };
    if path.is_dir() {
        path.push(DASHBOARD_PAGE);
    }
    serve_file(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_refused() {
        let root = Path::new("/srv/public");
        assert_eq!(
            public_file(root, "/eleves.json"),
            Some(PathBuf::from("/srv/public/eleves.json"))
        );
        assert_eq!(
            public_file(root, "/css/./app.css"),
            Some(PathBuf::from("/srv/public/css/app.css"))
        );
        assert_eq!(public_file(root, "/../data/professeurs.json"), None);
        assert_eq!(public_file(root, "/css/../../secret"), None);
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("eleves.JSON")), "application/json");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}

//! Build handler: world description in, freshly built artifact out.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::loader;
use crate::types::{BuildResponse, WorldConfig};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
};
use serde_json::Value;

/// POST /apworld/build - Generate the names modules and build the APWorld
///
/// The body is either raw YAML, or (with `Content-Type: application/json`) an
/// envelope holding `{"yaml": "<text>"}` or `{"data": {...}}`.
///
/// # Responses
///
/// - 200 `{"ok": true, "artifact": "<path>"}`
/// - 400 `{"error": "..."}` if the body is unusable
/// - 500 `{"error": "..."}` naming the failed step (plus `"code"` if the
///   builder exited unsuccessfully)
pub async fn build_apworld(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BuildResponse>> {
    tracing::info!(bytes = body.len(), "build requested");

    let text = request_yaml(&headers, &body)?;
    let document = loader::parse_document(&text)?;
    loader::require_sections(&document)?;
    let world = WorldConfig::from_document(&document)?;
    let normalized = loader::to_yaml(&document)?;

    // The build runs on its own task so a disconnecting client cannot drop
    // the lock while the builder process is still running.
    let pipeline = state.pipeline.clone();
    let build_lock = state.build_lock.clone();
    let task = tokio::spawn(async move {
        let _guard = build_lock.lock().await;
        pipeline.persist_document(&normalized).await?;
        pipeline.build(&world).await
    });
    let artifact = match task.await {
        Ok(result) => result?,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => return Err(Error::Other(format!("build task failed: {e}"))),
    };

    tracing::info!(artifact = %artifact.display(), "build succeeded");
    Ok(Json(BuildResponse::success(artifact)))
}

/// Extract the YAML text from a request body.
fn request_yaml(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if body.is_empty() {
        return Err(Error::EmptyBody);
    }

    if !is_json(headers) {
        return String::from_utf8(body.to_vec())
            .map_err(|e| Error::InvalidEncoding(e.to_string()));
    }

    let text = std::str::from_utf8(body).map_err(|e| Error::InvalidEncoding(e.to_string()))?;
    let envelope: Value =
        serde_json::from_str(text).map_err(|e| Error::InvalidJson(e.to_string()))?;

    if let Some(Value::String(yaml)) = envelope.get("yaml") {
        return Ok(yaml.clone());
    }
    match envelope.get("data") {
        Some(data @ Value::Object(_)) => {
            serde_yaml::to_string(data).map_err(|e| Error::Other(e.to_string()))
        }
        _ => Err(Error::MissingEnvelopeField),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

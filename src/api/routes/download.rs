//! Download handler for the last successfully built artifact.

use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    body::Body,
    extract::State,
    http::{Response, StatusCode, header},
};
use tokio_util::io::ReaderStream;

/// GET /apworld/download - Stream the current artifact
///
/// Returns 404 `{"error": "Artifact not found"}` until a build has succeeded.
/// The file is opened once, so a build finishing mid-download does not change
/// the bytes being sent.
pub async fn download_apworld(State(state): State<AppState>) -> Result<Response<Body>> {
    let path = &state.pipeline.paths().artifact;

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no artifact to download");
            return Err(Error::ArtifactNotFound);
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(Error::ArtifactNotFound);
    }

    tracing::info!(path = %path.display(), bytes = metadata.len(), "serving artifact");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", state.config.api.download_filename),
        )
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| Error::Other(format!("failed to build download response: {e}")))
}

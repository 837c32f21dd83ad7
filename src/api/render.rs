use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::RenderRequest;
use crate::services::RenderService;

/// Error body returned by `/render`
#[derive(Debug, Serialize, ToSchema)]
pub struct RenderErrorResponse {
    /// Error message (`"latex/gs failed"` for tool failures)
    pub error: String,
    /// Captured pdflatex/gs output, present for tool failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

/// Render a LaTeX math expression to PNG
///
/// The body is parsed as JSON whatever the Content-Type header says.
#[utoipa::path(
    post,
    path = "/render",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Rendered equation", content_type = "image/png"),
        (status = 400, description = "Empty tex, bad dpi or malformed body", body = RenderErrorResponse),
        (status = 500, description = "pdflatex or gs failed", body = RenderErrorResponse),
    ),
    tag = "Render"
)]
pub async fn handle_render(
    State(renderer): State<Arc<RenderService>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: RenderRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;

    tracing::debug!(
        tex_len = request.tex.len(),
        display = request.display,
        dpi = request.dpi,
        "Render request"
    );

    let png = renderer.render_request(&request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        png,
    )
        .into_response())
}

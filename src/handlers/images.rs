use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Image ids are never reused, so the id alone is a strong validator.
fn etag_for(id: &str) -> String {
    format!("\"img-{id}\"")
}

fn if_none_match_hits(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .map(|tag| tag.trim().trim_start_matches("W/"))
                .any(|tag| tag == etag)
        })
}

pub async fn serve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let etag = etag_for(&id);

    if if_none_match_hits(&headers, &etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    let image = state
        .images
        .get(&id)
        .await?
        .filter(|image| !image.data.is_empty())
        .ok_or(AppError::ImageNotFound)?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::ETAG, etag),
        ],
        image.data,
    )
        .into_response())
}

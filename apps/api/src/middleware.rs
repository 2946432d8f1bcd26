use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tessera_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let access_key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("bearer access key required".to_owned()))?;

    let caller = state.caller_directory.authenticate(access_key)?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

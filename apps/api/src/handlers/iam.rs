use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use tessera_core::{AppError, CallerIdentity};

use crate::dto::{IamRequest, IamResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn iam_action_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<IamRequest>, JsonRejection>,
) -> ApiResult<Json<IamResponse>> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::InvalidInput(format!("malformed request body: {}", rejection.body_text()))
    })?;
    let (kind, params) = payload.into_operation()?;

    let outcome = state.role_service.execute(&caller, kind, &params).await?;

    Ok(Json(IamResponse::from_outcome(kind, outcome)))
}

use super::{upstream_status, ApiError};
use crate::app::AppState;
use crate::error::{EvalError, Service};
use crate::evaluation::{pipeline, FullReportRequest, LocalEvaluationRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

fn evaluation_error(err: EvalError, failure: &str) -> ApiError {
    match err {
        EvalError::Validation(message) => ApiError::bad_request(message),
        EvalError::Upstream {
            service: Service::Completion,
            status,
            ..
        } => ApiError::new(
            upstream_status(Service::Completion, status),
            "Failed to generate evaluation",
        ),
        EvalError::MalformedResponse { reason, .. } => {
            ApiError::internal("Failed to parse evaluation response").with_details(reason)
        }
        other => ApiError::internal(failure).with_details(other.to_string()),
    }
}

pub async fn generate_full_report(
    State(state): State<AppState>,
    payload: Result<Json<FullReportRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match pipeline::evaluate_full_report(state.voice.as_ref(), state.llm.as_ref(), request).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            if !e.is_validation() {
                error!("failed to generate full evaluation: {}", e);
            }
            evaluation_error(e, "Failed to generate full evaluation").into_response()
        }
    }
}

pub async fn generate_from_local(
    State(state): State<AppState>,
    payload: Result<Json<LocalEvaluationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match pipeline::evaluate_local(state.llm.as_ref(), request).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            if !e.is_validation() {
                error!("failed to generate evaluation from local transcripts: {}", e);
            }
            evaluation_error(e, "Failed to generate evaluation").into_response()
        }
    }
}

use super::{upstream_status, ApiError};
use crate::app::AppState;
use crate::error::{EvalError, Service};
use crate::evaluation::{pipeline, CallAnalysisRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

fn analysis_error(err: EvalError) -> ApiError {
    match err {
        EvalError::Validation(message) => ApiError::bad_request(message),
        EvalError::Upstream {
            service: Service::Completion,
            status,
            ..
        } => ApiError::new(
            upstream_status(Service::Completion, status),
            format!("Completion API error: {}", status),
        ),
        EvalError::MalformedResponse { reason, .. } => {
            ApiError::internal("Failed to parse analysis").with_details(reason)
        }
        other => ApiError::internal("Failed to analyze call").with_details(other.to_string()),
    }
}

pub async fn analyze_call(
    State(state): State<AppState>,
    payload: Result<Json<CallAnalysisRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match pipeline::analyze_call(state.llm.as_ref(), request).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => {
            if !e.is_validation() {
                error!("failed to analyze call: {}", e);
            }
            analysis_error(e).into_response()
        }
    }
}

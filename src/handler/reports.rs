use super::{upstream_status, ApiError};
use crate::app::AppState;
use crate::error::{EvalError, Service};
use crate::evaluation::{extract, pipeline};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    pub call_id: Option<String>,
}

fn report_error(err: EvalError) -> ApiError {
    match err {
        EvalError::Validation(message) => ApiError::bad_request(message),
        EvalError::Upstream {
            service: Service::Completion,
            status,
            ..
        } => ApiError::new(
            upstream_status(Service::Completion, status),
            "Failed to generate analysis",
        ),
        EvalError::MalformedResponse { preview, .. } => {
            ApiError::internal("Failed to parse Gemini response. Please try again.")
                .with_details("A response was received from Gemini, but it could not be parsed correctly.")
                .with_preview(preview)
        }
        _ => ApiError::internal("Failed to generate report"),
    }
}

pub async fn generate_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let Some(call_id) = request.call_id.filter(|id| !id.trim().is_empty()) else {
        return ApiError::bad_request("Call ID is required").into_response();
    };
    info!(call_id = %call_id, "generating report");

    let response = match state.voice.get_job_details(&call_id).await {
        Ok(response) => response,
        Err(e) => {
            error!(call_id = %call_id, "failed to fetch call details: {}", e);
            return ApiError::internal("Failed to fetch call details from Hamsa").into_response();
        }
    };

    match pipeline::analyze_customer_call(state.llm.as_ref(), &call_id, extract::call_data(&response))
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            if !e.is_validation() {
                error!(call_id = %call_id, "failed to generate report: {}", e);
            }
            report_error(e).into_response()
        }
    }
}

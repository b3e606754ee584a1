use super::ApiError;
use crate::app::AppState;
use crate::evaluation::prompt::{build_call_script, ScriptLanguage};
use crate::hamsa::{
    types::{
        is_live, job_listing, jobs_of, live_call_listing, recording_listing, transcript_listing,
        CallAnalytics,
    },
    CallRequest, JobStatus, JobsFilter,
};
use crate::utils::employee_slug;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

const DEFAULT_SCENARIO: &str = "after-sales-followup";
const DEFAULT_LIMIT: u32 = 50;
const LIVE_CALLS_SCAN: u32 = 100;
const ANALYTICS_SCAN: u32 = 1000;
const STATISTICS_WINDOW_DAYS: i64 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/jobs", get(list_jobs))
        .route("/jobs/{id}", get(job_details))
        .route("/transcripts", get(list_transcripts))
        .route("/recordings", get(list_recordings))
        .route("/live-calls", get(list_live_calls))
        .route("/analytics", get(analytics))
        .route("/call", post(create_call))
        .route("/evaluation-call", post(create_evaluation_call))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_limit(limit: Option<&str>) -> u32 {
    limit
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(DEFAULT_LIMIT)
}

async fn status(State(state): State<AppState>) -> Response {
    match state.voice.get_project().await {
        Ok(_) => Json(json!({
            "connected": true,
            "message": "Connected to Shaffra AI Cloud",
            "timestamp": timestamp(),
        }))
        .into_response(),
        Err(e) => {
            warn!("voice provider unreachable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "connected": false,
                    "message": e.to_string(),
                    "timestamp": timestamp(),
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobsQuery {
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

async fn list_jobs(State(state): State<AppState>, Query(query): Query<JobsQuery>) -> Response {
    let filter = JobsFilter::newest(parse_limit(query.limit.as_deref()))
        .with_status(query.status.as_deref().and_then(JobStatus::parse))
        .with_search(query.search);

    match state.voice.get_jobs(&filter).await {
        Ok(response) => {
            let jobs: Vec<Value> = jobs_of(&response).iter().map(job_listing).collect();
            Json(json!({
                "success": true,
                "data": { "total": jobs.len(), "jobs": jobs },
            }))
            .into_response()
        }
        Err(e) => {
            error!("failed to fetch jobs: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

async fn job_details(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.voice.get_job_details(&id).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!(job_id = %id, "failed to fetch job details: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptsQuery {
    pub limit: Option<String>,
}

async fn list_transcripts(
    State(state): State<AppState>,
    Query(query): Query<TranscriptsQuery>,
) -> Response {
    let filter = JobsFilter::newest(parse_limit(query.limit.as_deref()))
        .with_status(Some(JobStatus::Completed));

    match state.voice.get_jobs(&filter).await {
        Ok(response) => {
            let transcripts: Vec<Value> =
                jobs_of(&response).iter().map(transcript_listing).collect();
            info!(count = transcripts.len(), "fetched transcripts");
            Json(json!({
                "success": true,
                "total": transcripts.len(),
                "data": transcripts,
            }))
            .into_response()
        }
        Err(e) => {
            error!("failed to fetch transcripts: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

async fn list_recordings(
    State(state): State<AppState>,
    Query(query): Query<TranscriptsQuery>,
) -> Response {
    let filter = JobsFilter::newest(parse_limit(query.limit.as_deref()))
        .with_status(Some(JobStatus::Completed));

    match state.voice.get_jobs(&filter).await {
        Ok(response) => {
            let recordings: Vec<Value> =
                jobs_of(&response).iter().filter_map(recording_listing).collect();
            Json(json!({
                "success": true,
                "data": recordings,
                "total": recordings.len(),
            }))
            .into_response()
        }
        Err(e) => {
            error!("failed to fetch recordings: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

async fn list_live_calls(State(state): State<AppState>) -> Response {
    match state.voice.get_jobs(&JobsFilter::newest(LIVE_CALLS_SCAN)).await {
        Ok(response) => {
            let jobs = jobs_of(&response);
            let now = Utc::now();
            let live_calls: Vec<Value> = jobs
                .iter()
                .filter(|job| is_live(job))
                .map(|job| live_call_listing(job, now))
                .collect();
            info!(live = live_calls.len(), scanned = jobs.len(), "fetched live calls");
            Json(json!({
                "success": true,
                "liveCalls": live_calls,
                "count": live_calls.len(),
            }))
            .into_response()
        }
        Err(e) => {
            error!("failed to fetch live calls: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

async fn analytics(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let start = now - Duration::days(STATISTICS_WINDOW_DAYS);
    let filter = JobsFilter::newest(ANALYTICS_SCAN);
    let (stats, jobs) = tokio::join!(
        state
            .voice
            .get_statistics_numbers(start.timestamp_millis(), now.timestamp_millis()),
        state.voice.get_jobs(&filter),
    );

    match stats.and_then(|stats| jobs.map(|jobs| (stats, jobs))) {
        Ok((stats, jobs)) => {
            Json(CallAnalytics::from_provider(&stats, jobs_of(&jobs), now)).into_response()
        }
        Err(e) => {
            error!("failed to fetch analytics: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// First non-blank string among `keys`, trimmed.
fn form_text(vars: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| vars.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn job_id_of(response: &Value) -> Value {
    response
        .pointer("/data/jobId")
        .or_else(|| response.pointer("/data/id"))
        .cloned()
        .unwrap_or(Value::Null)
}

async fn create_call(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let vars = body.get("variables").filter(|v| v.is_object()).unwrap_or(&body);
    let scenario_id = body
        .get("scenarioId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCENARIO);

    let customer_name = form_text(vars, &["customer_name", "customerName"]);
    let phone_number = form_text(vars, &["phoneNumber", "phone_number"]);
    if customer_name.is_empty() || phone_number.is_empty() {
        return ApiError::bad_request("اسم العميل ورقم الهاتف مطلوبان").into_response();
    }

    let Some(voice_agent_id) = state.config.hamsa.voice_agent_for(Some(scenario_id)) else {
        return ApiError::internal("HAMSA_VOICE_AGENT_ID is not configured").into_response();
    };

    let mut params = Map::new();
    params.insert("customer_name".to_string(), json!(customer_name));
    params.insert("phone_number".to_string(), json!(phone_number));
    params.insert(
        "service_date".to_string(),
        json!(form_text(vars, &["service_date", "serviceDate"])),
    );
    params.insert("questions".to_string(), json!(form_text(vars, &["questions"])));
    params.insert("note".to_string(), json!(form_text(vars, &["note", "notes"])));
    params.insert("actual_phone_number".to_string(), json!(phone_number));

    info!(scenario = scenario_id, voice_agent = voice_agent_id, "creating follow-up call");
    let request = CallRequest {
        to_number: phone_number.clone(),
        voice_agent_id: voice_agent_id.to_string(),
        params,
    };
    match state.voice.create_call_with_phone_number(request).await {
        Ok(response) => Json(json!({
            "success": true,
            "data": response.get("data"),
            "jobId": job_id_of(&response),
            "customerName": customer_name,
            "phoneNumber": phone_number,
            "message": "تم بدء المكالمة بنجاح",
        }))
        .into_response(),
        Err(e) => {
            error!("failed to create call: {}", e);
            ApiError::internal(e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationCallRequest {
    pub employee_name: Option<String>,
    pub employee_position: Option<String>,
    pub employee_id: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_role: Option<String>,
    pub language: Option<String>,
}

async fn create_evaluation_call(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationCallRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(employee_name), Some(contact_name), Some(contact_phone)) = (
        non_blank(request.employee_name),
        non_blank(request.contact_name),
        non_blank(request.contact_phone),
    ) else {
        return ApiError::bad_request("Employee name, contact name, and phone number are required")
            .into_response();
    };

    let Some(voice_agent_id) = state.config.hamsa.voice_agent_for(None) else {
        return ApiError::internal("HAMSA_VOICE_AGENT_ID is not configured").into_response();
    };

    let language = non_blank(request.language).unwrap_or_else(|| "en".to_string());
    let employee_id =
        non_blank(request.employee_id).unwrap_or_else(|| employee_slug(&employee_name));
    let employee_position = non_blank(request.employee_position);
    let contact_role = non_blank(request.contact_role);
    let script = build_call_script(
        &employee_name,
        employee_position.as_deref().unwrap_or("Employee"),
        contact_role.as_deref(),
        ScriptLanguage::from_code(&language),
    );

    let mut params = Map::new();
    params.insert("employee_name".to_string(), json!(employee_name));
    params.insert("employee_id".to_string(), json!(employee_id));
    params.insert(
        "employee_position".to_string(),
        json!(employee_position.as_deref().unwrap_or("Employee")),
    );
    params.insert("respondent_name".to_string(), json!(contact_name));
    params.insert("respondent_role".to_string(), json!(contact_role));
    params.insert("evaluation_prompt".to_string(), json!(script));
    params.insert("phone_number".to_string(), json!(contact_phone));
    params.insert("language".to_string(), json!(language));
    params.insert("evaluation_type".to_string(), json!("employee_evaluation"));
    params.insert("customerName".to_string(), json!(contact_name));

    info!(employee = %employee_name, contact = %contact_name, "creating evaluation call");
    let call = CallRequest {
        to_number: contact_phone.clone(),
        voice_agent_id: voice_agent_id.to_string(),
        params,
    };
    match state.voice.create_call_with_phone_number(call).await {
        Ok(response) => Json(json!({
            "success": true,
            "data": response.get("data"),
            "jobId": job_id_of(&response),
            "customerName": contact_name,
            "phoneNumber": contact_phone,
            "employeeId": employee_id,
            "employeeName": employee_name,
            "employeePosition": employee_position,
            "contactName": contact_name,
            "contactRole": contact_role,
            "language": language,
            "message": format!("Evaluation call initiated for {}", contact_name),
        }))
        .into_response(),
        Err(e) => {
            error!("failed to create evaluation call: {}", e);
            ApiError::internal(e.to_string()).into_response()
        }
    }
}

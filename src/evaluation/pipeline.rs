use super::{
    extract::{self, ExtractedTranscript, MIN_SCRIPT_CHARS},
    normalize, prompt, schema,
};
use crate::error::{EvalError, Result};
use crate::hamsa::VoiceProvider;
use crate::llm::{request_evaluation, CompletionProvider, CompletionRequest};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const EMPLOYEE_REQUIRED: &str = "Employee ID and name are required";
pub const CALL_REQUIRED: &str = "At least one call ID is required";
pub const TRANSCRIPT_REQUIRED: &str = "At least one transcript is required";
pub const NO_TRANSCRIPTS_FETCHED: &str =
    "Could not fetch any call transcripts. Please ensure the calls have completed and have transcript data.";
pub const NO_VALID_TRANSCRIPT: &str = "No valid transcript available for this call";
pub const ANALYSIS_TRANSCRIPT_REQUIRED: &str = "Transcript is required";

const TRANSCRIPT_LOG_PREVIEW: usize = 200;

/// Body of the full-report request. Caller-supplied `transcripts` take
/// priority over fetching `callIds` from the voice provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullReportRequest {
    pub employee_id: Option<String>,
    pub employee_name: Option<String>,
    pub call_ids: Vec<String>,
    pub transcripts: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalEvaluationRequest {
    pub employee_id: Option<String>,
    pub employee_name: Option<String>,
    pub transcripts: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub success: bool,
    pub employee_id: String,
    pub employee_name: String,
    pub evaluation: Value,
    pub metrics: Value,
    pub generated_at: String,
    pub number_of_calls: usize,
}

impl EvaluationReport {
    fn new(employee_id: String, employee_name: String, evaluation: Value, number_of_calls: usize) -> Self {
        let metrics = evaluation
            .get("performanceMetrics")
            .cloned()
            .unwrap_or(Value::Null);
        Self {
            success: true,
            employee_id,
            employee_name,
            evaluation,
            metrics,
            generated_at: now_iso(),
            number_of_calls,
        }
    }
}

/// Customer-behavior report for a single call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub id: String,
    pub call_id: String,
    pub customer_name: String,
    pub phone_number: String,
    pub customer_email: String,
    pub duration: Value,
    pub status: String,
    pub created_at: String,
    pub language: String,
    pub transcript: String,
    pub recording_url: String,
    pub analysis: Value,
    pub generated_at: String,
}

/// Body of the single-call analysis request. `language` is `ar` or `en`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallAnalysisRequest {
    pub transcript: Option<String>,
    pub customer_name: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallAnalysis {
    pub analysis: Value,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn require_employee(id: Option<String>, name: Option<String>) -> Result<(String, String)> {
    let id = id.filter(|v| !v.trim().is_empty());
    let name = name.filter(|v| !v.trim().is_empty());
    match (id, name) {
        (Some(id), Some(name)) => Ok((id, name)),
        _ => Err(EvalError::validation(EMPLOYEE_REQUIRED)),
    }
}

fn supplied_transcripts(entries: &[Value]) -> Vec<ExtractedTranscript> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let parsed = ExtractedTranscript::from_supplied(idx, entry);
            if parsed.is_none() {
                warn!(index = idx, "dropping supplied transcript without text");
            }
            parsed
        })
        .collect()
}

/// Fetches every call concurrently. A failed lookup only drops that call.
pub async fn collect_transcripts(
    voice: &dyn VoiceProvider,
    call_ids: &[String],
) -> Vec<ExtractedTranscript> {
    let start_time = Instant::now();
    let lookups = call_ids.iter().map(|call_id| async move {
        match voice.get_job_details(call_id).await {
            Ok(response) => {
                let extracted =
                    ExtractedTranscript::from_record(call_id, extract::call_data(&response));
                debug!(
                    call_id = %call_id,
                    length = extracted.transcript.len(),
                    preview = crate::utils::preview(&extracted.transcript, TRANSCRIPT_LOG_PREVIEW),
                    "transcript extracted"
                );
                Some(extracted)
            }
            Err(e) => {
                warn!(call_id = %call_id, "failed to fetch job details: {}", e);
                None
            }
        }
    });

    let fetched: Vec<ExtractedTranscript> = join_all(lookups).await.into_iter().flatten().collect();
    info!(
        requested = call_ids.len(),
        fetched = fetched.len(),
        elapsed = start_time.elapsed().as_millis() as u64,
        "fetched call details"
    );
    fetched
}

/// Builds the 360° prompt and asks the completion provider once.
pub async fn request_employee_evaluation(
    llm: &dyn CompletionProvider,
    employee_name: &str,
    transcripts: &[ExtractedTranscript],
) -> Result<Value> {
    let request = CompletionRequest {
        system_instruction: prompt::EVALUATION_SYSTEM_INSTRUCTION.to_string(),
        prompt: prompt::build_evaluation_prompt(employee_name, transcripts),
        schema: schema::employee_evaluation_schema(),
    };
    request_evaluation(llm, &request).await
}

pub async fn evaluate_full_report(
    voice: &dyn VoiceProvider,
    llm: &dyn CompletionProvider,
    request: FullReportRequest,
) -> Result<EvaluationReport> {
    let (employee_id, employee_name) = require_employee(request.employee_id, request.employee_name)?;
    if request.call_ids.is_empty() && request.transcripts.is_empty() {
        return Err(EvalError::validation(CALL_REQUIRED));
    }
    info!(employee = %employee_name, calls = request.call_ids.len(), "generating full evaluation");

    let collected = if request.transcripts.is_empty() {
        collect_transcripts(voice, &request.call_ids).await
    } else {
        supplied_transcripts(&request.transcripts)
    };
    let usable: Vec<ExtractedTranscript> = collected.into_iter().filter(|t| t.is_usable()).collect();
    if usable.is_empty() {
        warn!(employee = %employee_name, "no usable transcripts");
        return Err(EvalError::validation(NO_TRANSCRIPTS_FETCHED));
    }

    let evaluation = request_employee_evaluation(llm, &employee_name, &usable).await?;
    info!(employee = %employee_name, calls = usable.len(), "full evaluation generated");
    Ok(EvaluationReport::new(employee_id, employee_name, evaluation, usable.len()))
}

pub async fn evaluate_local(
    llm: &dyn CompletionProvider,
    request: LocalEvaluationRequest,
) -> Result<EvaluationReport> {
    let (employee_id, employee_name) = require_employee(request.employee_id, request.employee_name)?;
    let usable = supplied_transcripts(&request.transcripts);
    if usable.is_empty() {
        return Err(EvalError::validation(TRANSCRIPT_REQUIRED));
    }
    info!(employee = %employee_name, calls = usable.len(), "generating evaluation from local transcripts");

    let evaluation = request_employee_evaluation(llm, &employee_name, &usable).await?;
    Ok(EvaluationReport::new(employee_id, employee_name, evaluation, usable.len()))
}

/// Customer-behavior analysis of one fetched call. `record` is the unwrapped
/// job (see [`extract::call_data`]).
pub async fn analyze_customer_call(
    llm: &dyn CompletionProvider,
    call_id: &str,
    record: &Value,
) -> Result<CustomerReport> {
    let transcript = extract::extract_transcript(record);
    if transcript.chars().count() < MIN_SCRIPT_CHARS {
        warn!(call_id, length = transcript.len(), "no valid transcript for report");
        return Err(EvalError::validation(NO_VALID_TRANSCRIPT));
    }
    let phone_number = extract::phone_number(record);
    debug!(call_id, phone = %phone_number, "generating customer analysis");

    let request = CompletionRequest {
        system_instruction: prompt::CUSTOMER_ANALYSIS_SYSTEM_INSTRUCTION.to_string(),
        prompt: prompt::build_customer_analysis_prompt(&transcript),
        schema: schema::customer_analysis_schema(),
    };
    let analysis = normalize::normalize_customer_analysis(request_evaluation(llm, &request).await?);

    let customer_name = analysis
        .get("customerName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(extract::UNKNOWN_RESPONDENT)
        .to_string();
    let status = extract::first_text(record, &["/status", "/data/status"]).unwrap_or("Completed");
    let created_at = extract::first_text(record, &["/createdAt", "/data/createdAt"])
        .map(str::to_string)
        .unwrap_or_else(now_iso);

    info!(call_id, customer = %customer_name, "customer report generated");
    Ok(CustomerReport {
        id: call_id.to_string(),
        call_id: call_id.to_string(),
        customer_name,
        phone_number,
        customer_email: extract::customer_email(record).to_string(),
        duration: extract::duration_value(record),
        status: status.to_string(),
        created_at,
        language: extract::language(record).to_string(),
        transcript,
        recording_url: extract::recording_url(record).to_string(),
        analysis,
        generated_at: now_iso(),
    })
}

/// Quality analysis of one caller-supplied transcript, answered in the
/// requested language.
pub async fn analyze_call(
    llm: &dyn CompletionProvider,
    request: CallAnalysisRequest,
) -> Result<CallAnalysis> {
    let transcript = request
        .transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| EvalError::validation(ANALYSIS_TRANSCRIPT_REQUIRED))?;
    let language = prompt::ScriptLanguage::from_code(request.language.as_deref().unwrap_or("en"));
    debug!(
        customer = request.customer_name.as_deref().unwrap_or("-"),
        ?language,
        length = transcript.len(),
        "analyzing call"
    );

    let completion = CompletionRequest {
        system_instruction: prompt::call_analysis_system_instruction(language).to_string(),
        prompt: prompt::build_call_analysis_prompt(&transcript, language),
        schema: schema::call_analysis_schema(),
    };
    let analysis = request_evaluation(llm, &completion).await?;
    Ok(CallAnalysis { analysis })
}

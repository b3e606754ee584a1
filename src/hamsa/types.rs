use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(JobStatus::Pending),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// Body of `POST /jobs/all`. `skip` is 1-based on the provider side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobsFilter {
    pub sort: SortSpec,
    pub take: u32,
    pub skip: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl Default for JobsFilter {
    fn default() -> Self {
        Self {
            sort: SortSpec {
                field: "createdAt".to_string(),
                direction: SortDirection::Desc,
            },
            take: 50,
            skip: 1,
            search: None,
            status: None,
        }
    }
}

impl JobsFilter {
    pub fn newest(take: u32) -> Self {
        Self {
            take,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Option<JobStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub to_number: String,
    pub voice_agent_id: String,
    /// Variables handed to the voice agent; surfaced again under
    /// `agentDetails.params` in job details.
    pub params: Map<String, Value>,
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn seconds(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.max(0.0).round() as u64).unwrap_or(0),
        _ => 0,
    }
}

/// `MM:SS`, minutes not capped at 59.
pub fn format_mm_ss(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Customer name and phone of an outbound call. The job title carries
/// `"name|phone"`; the call attributes back up a missing or templated phone.
fn title_contact<'a>(job: &'a Value, unknown_name: &'a str) -> (&'a str, &'a str) {
    let title = str_at(job, &["title"]).unwrap_or_default();
    let mut parts = title.split('|').map(str::trim);
    let customer_name = parts.next().filter(|s| !s.is_empty()).unwrap_or(unknown_name);
    let mut phone_number = parts.next().filter(|s| !s.is_empty()).unwrap_or("N/A");

    if phone_number == "N/A" || phone_number.contains('/') {
        phone_number = str_at(job, &["attributes", "actual_phone_number"])
            .or_else(|| str_at(job, &["attributes", "phone_number"]))
            .unwrap_or(phone_number);
    }
    (customer_name, phone_number)
}

/// Dashboard view of one provider job.
pub fn job_listing(job: &Value) -> Value {
    let (customer_name, phone_number) = title_contact(job, "Unknown");

    let status = str_at(job, &["status"])
        .map(str::to_lowercase)
        .unwrap_or_else(|| "completed".to_string());

    serde_json::json!({
        "id": job.get("id"),
        "type": "outboundPhoneCall",
        "status": status,
        "customer": { "number": phone_number, "name": customer_name },
        "phoneNumber": { "number": phone_number },
        "duration": seconds(job, "callDuration"),
        "endedAt": job.get("updatedAt"),
        "startedAt": job.get("createdAt"),
        "createdAt": job.get("createdAt"),
        "cost": job.get("cost").cloned().unwrap_or(Value::from(0)),
        "recordingUrl": job.get("url"),
        "hamsaData": {
            "title": job.get("title"),
            "agentName": job.pointer("/attributes/agentName"),
            "voice": job.pointer("/attributes/voice"),
            "callDuration": job.get("callDuration"),
        },
    })
}

/// Transcript list entry. Customer identity lives in the dashboard's local
/// contacts, so placeholders are sent here.
pub fn transcript_listing(job: &Value) -> Value {
    let transcript = str_at(job, &["toScript"])
        .or_else(|| str_at(job, &["fromScript"]))
        .or_else(|| str_at(job, &["transcript"]))
        .unwrap_or_default();

    serde_json::json!({
        "id": job.get("id"),
        "jobId": job.get("id"),
        "transcript": transcript,
        "language": str_at(job, &["agentDetails", "lang"]).unwrap_or("ar"),
        "createdAt": job.get("createdAt"),
        "duration": format_mm_ss(seconds(job, "callDuration")),
        "agentDetails": {
            "params": { "customerName": "Unknown", "phoneNumber": "N/A" },
        },
    })
}

/// Recording entry for a completed job, `None` when the job has no media.
pub fn recording_listing(job: &Value) -> Option<Value> {
    let url = str_at(job, &["url"])?;
    Some(serde_json::json!({
        "id": job.get("id"),
        "jobId": job.get("id"),
        "recordingUrl": url,
        "mediaUrl": url,
        "duration": format_mm_ss(seconds(job, "callDuration")),
        "createdAt": job.get("createdAt"),
        "customer": { "name": "Unknown", "number": "N/A" },
        "cost": job.get("cost").cloned().unwrap_or(Value::from(0)),
    }))
}

/// Jobs still queued or on the line.
pub fn is_live(job: &Value) -> bool {
    let status = str_at(job, &["status"]).unwrap_or_default().to_ascii_uppercase();
    matches!(
        status.as_str(),
        "PENDING" | "IN_PROGRESS" | "IN-PROGRESS" | "RUNNING"
    )
}

pub fn live_call_listing(job: &Value, now: DateTime<Utc>) -> Value {
    let (customer_name, phone_number) = title_contact(job, "Unknown Customer");
    let created_at = str_at(job, &["createdAt"])
        .or_else(|| str_at(job, &["created_at"]))
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    serde_json::json!({
        "id": job.get("id"),
        "jobId": job.get("id"),
        "customerName": customer_name,
        "phoneNumber": phone_number,
        "status": job.get("status"),
        "createdAt": created_at,
        "duration": seconds(job, "callDuration"),
        "variables": job.get("attributes").cloned().unwrap_or_else(|| serde_json::json!({})),
    })
}

/// Days counted as "recent" by the analytics summary.
pub const ANALYTICS_WINDOW_DAYS: i64 = 7;

/// Dashboard analytics: provider usage totals plus status counts over the
/// newest jobs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallAnalytics {
    pub total_calls: u64,
    pub active_calls: usize,
    pub completed_calls: usize,
    pub failed_calls: usize,
    /// Seconds.
    pub total_duration: u64,
    /// Seconds per call.
    pub average_duration: u64,
    pub success_rate: f64,
    pub total_cost: f64,
}

fn stat_value(stats: &Value, name: &str) -> f64 {
    match stats.pointer(&format!("/data/{}/value", name)) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn created_at(job: &Value) -> Option<DateTime<Utc>> {
    str_at(job, &["createdAt"])
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl CallAnalytics {
    pub fn from_provider(stats: &Value, jobs: &[Value], now: DateTime<Utc>) -> Self {
        let total_calls = stat_value(stats, "requests").max(0.0) as u64;
        let total_seconds = (stat_value(stats, "media").max(0.0) * 60.0).round();

        let status_of = |job: &Value| str_at(job, &["status"]).unwrap_or_default().to_lowercase();
        let active_calls = jobs
            .iter()
            .filter(|job| matches!(status_of(job).as_str(), "processing" | "pending"))
            .count();
        let failed_calls = jobs
            .iter()
            .filter(|job| matches!(status_of(job).as_str(), "failed" | "error"))
            .count();

        let window_start = now - Duration::days(ANALYTICS_WINDOW_DAYS);
        let recent: Vec<&Value> = jobs
            .iter()
            .filter(|job| created_at(job).is_some_and(|t| t >= window_start))
            .collect();
        let completed_calls = recent
            .iter()
            .filter(|job| status_of(job) == "completed")
            .count();

        Self {
            total_calls,
            active_calls,
            completed_calls,
            failed_calls,
            total_duration: total_seconds as u64,
            average_duration: if total_calls > 0 {
                (total_seconds / total_calls as f64).round() as u64
            } else {
                0
            },
            success_rate: if recent.is_empty() {
                0.0
            } else {
                completed_calls as f64 / recent.len() as f64
            },
            total_cost: stat_value(stats, "credits"),
        }
    }
}

/// `data.jobs` of a `/jobs/all` response, empty when absent.
pub fn jobs_of(response: &Value) -> &[Value] {
    response
        .pointer("/data/jobs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

use serde::Serialize;
use serde_json::Value;

/// Minimum length for a plain script field to count as a transcript.
/// Shorter strings are provider placeholders.
pub const MIN_SCRIPT_CHARS: usize = 10;

pub const UNKNOWN_RESPONDENT: &str = "Unknown";
pub const UNNAMED_RESPONDENT: &str = "غير معروف";
pub const UNSPECIFIED_ROLE: &str = "غير محدد";
pub const PHONE_UNAVAILABLE: &str = "غير متوفر";

pub type Probe = fn(&Value) -> Option<String>;

/// Transcript rules, in precedence order. The first rule that applies wins,
/// even when it renders to an empty string.
pub const TRANSCRIPT_RULES: [Probe; 4] = [
    transcript_from_turns,
    transcript_from_scripts,
    transcript_from_messages,
    transcript_from_conversation,
];

const SCRIPT_FIELDS: [&str; 6] = [
    "/toScript",
    "/fromScript",
    "/data/toScript",
    "/data/fromScript",
    "/data/transcript",
    "/transcript",
];

const PHONE_FIELDS: [&str; 7] = [
    "/data/toNumber",
    "/data/params/actual_phone_number",
    "/data/params/phone_number",
    "/toNumber",
    "/params/actual_phone_number",
    "/agentDetails/params/phone_number",
    "/data/agentDetails/params/phone_number",
];

const DURATION_FIELDS: [&str; 4] = [
    "/data/callDuration",
    "/callDuration",
    "/data/duration",
    "/duration",
];

const EMAIL_FIELDS: [&str; 5] = [
    "/agentDetails/params/customerEmail",
    "/params/customerEmail",
    "/metadata/customerEmail",
    "/data/params/customerEmail",
    "/data/agentDetails/params/customerEmail",
];

const LANGUAGE_FIELDS: [&str; 3] = ["/agentDetails/lang", "/data/agentDetails/lang", "/language"];

const RECORDING_FIELDS: [&str; 4] = [
    "/recordingUrl",
    "/data/recordingUrl",
    "/audioUrl",
    "/data/audioUrl",
];

/// Transcript plus respondent metadata for one call, whether resolved from a
/// provider record or supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTranscript {
    pub call_id: String,
    pub transcript: String,
    pub respondent_name: String,
    pub respondent_role: String,
    pub duration_seconds: u64,
    pub phone_number: String,
}

impl ExtractedTranscript {
    pub fn from_record(call_id: &str, record: &Value) -> Self {
        let params = agent_params(record);
        let respondent_name = params
            .and_then(|p| text_at(p, "/respondent_name"))
            .or_else(|| text_at(record, "/data/toNumber"))
            .or_else(|| text_at(record, "/toNumber"))
            .unwrap_or(UNKNOWN_RESPONDENT);
        let respondent_role = params
            .and_then(|p| text_at(p, "/respondent_role"))
            .unwrap_or(UNSPECIFIED_ROLE);

        Self {
            call_id: call_id.to_string(),
            transcript: extract_transcript(record),
            respondent_name: respondent_name.to_string(),
            respondent_role: respondent_role.to_string(),
            duration_seconds: duration_seconds(record),
            phone_number: phone_number(record),
        }
    }

    /// Caller-supplied transcript entry. Entries without transcript text are
    /// rejected.
    pub fn from_supplied(index: usize, entry: &Value) -> Option<Self> {
        let transcript = text_at(entry, "/transcript").filter(|t| !t.trim().is_empty())?;
        let respondent_name = text_at(entry, "/respondentName")
            .or_else(|| text_at(entry, "/contactName"))
            .or_else(|| text_at(entry, "/params/respondent_name"))
            .unwrap_or(UNNAMED_RESPONDENT);
        let respondent_role = text_at(entry, "/respondentRole")
            .or_else(|| text_at(entry, "/params/respondent_role"))
            .unwrap_or(UNSPECIFIED_ROLE);
        let call_id = text_at(entry, "/callId")
            .map(str::to_string)
            .unwrap_or_else(|| format!("local-{}", index + 1));

        Some(Self {
            call_id,
            transcript: transcript.to_string(),
            respondent_name: respondent_name.to_string(),
            respondent_role: respondent_role.to_string(),
            duration_seconds: entry.get("duration").and_then(as_seconds).unwrap_or(0),
            phone_number: text_at(entry, "/phoneNumber")
                .unwrap_or(PHONE_UNAVAILABLE)
                .to_string(),
        })
    }

    pub fn is_usable(&self) -> bool {
        !self.transcript.trim().is_empty()
    }

    /// Call length rounded to whole minutes, half up.
    pub fn duration_minutes(&self) -> u64 {
        self.duration_seconds.saturating_add(30) / 60
    }
}

/// Provider responses wrap the job in `data`; some endpoints return it bare.
pub fn call_data(response: &Value) -> &Value {
    response
        .get("data")
        .filter(|data| is_truthy(data))
        .unwrap_or(response)
}

pub fn extract_transcript(record: &Value) -> String {
    TRANSCRIPT_RULES
        .iter()
        .find_map(|rule| rule(record))
        .unwrap_or_default()
}

pub fn phone_number(record: &Value) -> String {
    PHONE_FIELDS
        .iter()
        .filter_map(|path| text_at(record, path))
        .find(|phone| !phone.contains('/'))
        .unwrap_or(PHONE_UNAVAILABLE)
        .to_string()
}

pub fn duration_seconds(record: &Value) -> u64 {
    DURATION_FIELDS
        .iter()
        .filter_map(|path| record.pointer(path))
        .find(|value| is_truthy(value))
        .and_then(as_seconds)
        .unwrap_or(0)
}

/// Raw duration value as the provider sent it, or `0`.
pub fn duration_value(record: &Value) -> Value {
    DURATION_FIELDS
        .iter()
        .filter_map(|path| record.pointer(path))
        .find(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| Value::from(0))
}

pub fn customer_email(record: &Value) -> &str {
    first_text(record, &EMAIL_FIELDS).unwrap_or_default()
}

pub fn language(record: &Value) -> &str {
    first_text(record, &LANGUAGE_FIELDS).unwrap_or("en")
}

pub fn recording_url(record: &Value) -> &str {
    first_text(record, &RECORDING_FIELDS).unwrap_or_default()
}

pub fn first_text<'a>(record: &'a Value, paths: &[&str]) -> Option<&'a str> {
    paths.iter().find_map(|path| text_at(record, path))
}

fn agent_params(record: &Value) -> Option<&Value> {
    ["/data/agentDetails/params", "/agentDetails/params"]
        .iter()
        .filter_map(|path| record.pointer(path))
        .find(|params| is_truthy(params))
}

/// Rule 1: `data.jobResponse.transcription` turn list.
fn transcript_from_turns(record: &Value) -> Option<String> {
    let turns = record
        .pointer("/data/jobResponse/transcription")
        .and_then(Value::as_array)?;
    let lines: Vec<String> = turns
        .iter()
        .filter_map(|turn| {
            if let Some(agent) = turn.get("Agent").filter(|v| is_truthy(v)) {
                Some(format!("Agent: {}", render(agent)))
            } else {
                turn.get("User")
                    .filter(|v| is_truthy(v))
                    .map(|user| format!("Customer: {}", render(user)))
            }
        })
        .collect();
    Some(lines.join("\n"))
}

/// Rule 2: plain script fields longer than the placeholder threshold.
fn transcript_from_scripts(record: &Value) -> Option<String> {
    SCRIPT_FIELDS
        .iter()
        .filter_map(|path| record.pointer(path).and_then(Value::as_str))
        .find(|script| script.chars().count() > MIN_SCRIPT_CHARS)
        .map(str::to_string)
}

/// Rule 3: chat-style `messages` array.
fn transcript_from_messages(record: &Value) -> Option<String> {
    let messages = record.get("messages").and_then(Value::as_array)?;
    let lines: Vec<String> = messages
        .iter()
        .filter_map(|message| {
            let content = ["message", "content", "text"]
                .iter()
                .filter_map(|key| message.get(*key))
                .find(|v| is_truthy(v))?;
            let label = match message.get("role").and_then(Value::as_str) {
                Some("assistant" | "bot" | "agent") => "Agent",
                _ => "Customer",
            };
            Some(format!("{}: {}", label, render(content)))
        })
        .collect();
    Some(lines.join("\n"))
}

/// Rule 4: free-form `conversation` field.
fn transcript_from_conversation(record: &Value) -> Option<String> {
    record
        .get("conversation")
        .filter(|v| is_truthy(v))
        .map(render)
}

fn text_at<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    value
        .pointer(path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0).round() as u64),
        _ => None,
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

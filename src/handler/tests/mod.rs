use crate::app::{create_router, AppState, AppStateBuilder};
use crate::config::Config;
use crate::error::{EvalError, Service};
use crate::hamsa::{JobStatus, MockVoiceProvider};
use crate::llm::MockCompletionProvider;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

const EVALUATION_REPLY: &str = r#"{
    "overallSummary": "Strong communicator.",
    "keyStrengths": ["clarity"],
    "areasForImprovement": ["time management"],
    "performanceMetrics": {
        "overallScore": 8, "communicationSkills": 9, "technicalCompetence": 7,
        "customerService": 8, "teamwork": 8, "problemSolving": 7
    },
    "recommendations": ["shadow a senior engineer"],
    "feedbackAnalysis": "Managers and peers agree.",
    "careerDevelopment": ["lead a small project"]
}"#;

fn completion(reply: Result<&'static str, u16>, calls: usize) -> MockCompletionProvider {
    let mut llm = MockCompletionProvider::new();
    llm.expect_name().return_const("mock");
    llm.expect_complete_json()
        .times(calls)
        .returning(move |_| match reply {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(EvalError::Upstream {
                service: Service::Completion,
                status,
                body: "upstream failure".to_string(),
            }),
        });
    llm
}

fn state(voice: MockVoiceProvider, llm: MockCompletionProvider, config: Config) -> AppState {
    AppStateBuilder::new()
        .with_config(config)
        .with_voice_provider(Arc::new(voice))
        .with_completion_provider(Arc::new(llm))
        .build()
        .unwrap()
}

async fn serve(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    format!("http://{}", addr)
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

async fn get_json(base: &str, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("{}{}", base, path)).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn job_with_transcript(respondent: &str) -> Value {
    json!({
        "success": true,
        "data": {
            "id": "job-1",
            "status": "COMPLETED",
            "callDuration": 300,
            "data": {
                "jobResponse": {
                    "transcription": [
                        { "Agent": "How would you describe Omar's work?" },
                        { "User": "He is dependable and clear." },
                    ]
                }
            },
            "agentDetails": { "params": { "respondent_name": respondent, "respondent_role": "manager" } },
        }
    })
}

#[tokio::test]
async fn test_health_and_version() {
    let base = serve(state(MockVoiceProvider::new(), completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&base, "/api/version").await;
    assert_eq!(status, 200);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_full_report_from_call_ids() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_job_details()
        .times(1)
        .returning(|_| Ok(job_with_transcript("Sara")));
    let base = serve(state(voice, completion(Ok(EVALUATION_REPLY), 1), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-full-report",
        json!({ "employeeId": "omar", "employeeName": "Omar", "callIds": ["job-1"] }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["employeeId"], "omar");
    assert_eq!(body["numberOfCalls"], 1);
    assert_eq!(body["metrics"]["overallScore"], 8);
    assert_eq!(body["evaluation"]["feedbackAnalysis"], "Managers and peers agree.");
    assert!(body["generatedAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_full_report_validation() {
    let base = serve(state(MockVoiceProvider::new(), completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-full-report",
        json!({ "employeeName": "Omar", "callIds": ["job-1"] }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Employee ID and name are required");

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-full-report",
        json!({ "employeeId": "omar", "employeeName": "Omar", "callIds": [] }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "At least one call ID is required");
}

#[tokio::test]
async fn test_full_report_zero_transcripts_is_bad_request() {
    let mut voice = MockVoiceProvider::new();
    voice.expect_get_job_details().returning(|_| {
        Err(EvalError::Upstream {
            service: Service::VoiceProvider,
            status: 500,
            body: "down".to_string(),
        })
    });
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-full-report",
        json!({ "employeeId": "omar", "employeeName": "Omar", "callIds": ["a", "b"] }),
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Could not fetch any call transcripts"));
}

#[tokio::test]
async fn test_local_evaluation_mirrors_completion_status() {
    let base = serve(state(MockVoiceProvider::new(), completion(Err(429), 1), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-from-local",
        json!({
            "employeeId": "omar",
            "employeeName": "Omar",
            "transcripts": [{ "respondentName": "Sara", "duration": 120, "transcript": "Agent: hi\nCustomer: hello" }],
        }),
    )
    .await;
    assert_eq!(status, 429);
    assert_eq!(body, json!({ "error": "Failed to generate evaluation" }));
}

#[tokio::test]
async fn test_local_evaluation_parse_failure() {
    let base = serve(state(MockVoiceProvider::new(), completion(Ok("not json"), 1), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/evaluation/generate-from-local",
        json!({
            "employeeId": "omar",
            "employeeName": "Omar",
            "transcripts": [{ "transcript": "Agent: hi\nCustomer: hello" }],
        }),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to parse evaluation response");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_invalid_body_is_bad_request() {
    let base = serve(state(MockVoiceProvider::new(), completion(Ok("{}"), 0), Config::default())).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/evaluation/generate-from-local", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn test_report_parse_failure_includes_preview() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_job_details()
        .returning(|_| Ok(job_with_transcript("Sara")));
    let base = serve(state(voice, completion(Ok("I cannot answer that"), 1), Config::default())).await;

    let (status, body) = post_json(&base, "/api/reports/generate", json!({ "callId": "job-1" })).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to parse Gemini response. Please try again.");
    assert_eq!(body["responsePreview"], "I cannot answer that");
}

#[tokio::test]
async fn test_report_requires_call_and_transcript() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_job_details()
        .returning(|_| Ok(json!({ "data": { "toScript": "too short" } })));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = post_json(&base, "/api/reports/generate", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Call ID is required");

    let (status, body) = post_json(&base, "/api/reports/generate", json!({ "callId": "job-1" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No valid transcript available for this call");
}

#[tokio::test]
async fn test_report_fetch_failure() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_job_details()
        .returning(|_| Err(EvalError::Config("HAMSA_API_KEY is not set".to_string())));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = post_json(&base, "/api/reports/generate", json!({ "callId": "job-1" })).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to fetch call details from Hamsa");
}

#[tokio::test]
async fn test_hamsa_status() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_project()
        .times(1)
        .returning(|| Ok(json!({ "data": { "id": "proj-1" } })));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;
    let (status, body) = get_json(&base, "/api/hamsa/status").await;
    assert_eq!(status, 200);
    assert_eq!(body["connected"], true);

    let mut voice = MockVoiceProvider::new();
    voice.expect_get_project().returning(|| {
        Err(EvalError::Upstream {
            service: Service::VoiceProvider,
            status: 401,
            body: "invalid token".to_string(),
        })
    });
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;
    let (status, body) = get_json(&base, "/api/hamsa/status").await;
    assert_eq!(status, 503);
    assert_eq!(body["connected"], false);
    assert!(body["message"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_hamsa_jobs_and_transcripts() {
    let mut voice = MockVoiceProvider::new();
    voice.expect_get_jobs().times(2).returning(|filter| {
        let jobs = if filter.status == Some(JobStatus::Completed) {
            json!([{ "id": "job-2", "toScript": "Agent: hello", "callDuration": 65 }])
        } else {
            assert_eq!(filter.take, 5);
            assert_eq!(filter.search.as_deref(), Some("Ahmed"));
            json!([{ "id": "job-1", "title": "Ahmed|+97312345678", "status": "PENDING" }])
        };
        Ok(json!({ "data": { "jobs": jobs } }))
    });
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/api/hamsa/jobs?limit=5&search=Ahmed").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["jobs"][0]["customer"]["name"], "Ahmed");
    assert_eq!(body["data"]["jobs"][0]["status"], "pending");

    let (status, body) = get_json(&base, "/api/hamsa/transcripts?limit=abc").await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["duration"], "01:05");
}

#[tokio::test]
async fn test_hamsa_job_details_passthrough() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_job_details()
        .withf(|id| id == "job-77")
        .returning(|id| Ok(json!({ "data": { "id": id } })));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/api/hamsa/jobs/job-77").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["id"], "job-77");
}

#[tokio::test]
async fn test_follow_up_call() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_create_call_with_phone_number()
        .times(1)
        .withf(|request| {
            request.to_number == "+97312345678"
                && request.voice_agent_id == "ac90bc4a-7e12-43c0-8009-9d462d15896c"
                && request.params["customer_name"] == "Ahmed"
                && request.params["actual_phone_number"] == "+97312345678"
                && request.params["note"] == "call after 5pm"
        })
        .returning(|_| Ok(json!({ "success": true, "data": { "jobId": "job-5" } })));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = post_json(&base, "/api/hamsa/call", json!({ "customer_name": "Ahmed" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "اسم العميل ورقم الهاتف مطلوبان");

    let (status, body) = post_json(
        &base,
        "/api/hamsa/call",
        json!({
            "variables": { "customerName": " Ahmed ", "phone_number": "+97312345678", "notes": "call after 5pm" }
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["jobId"], "job-5");
    assert_eq!(body["message"], "تم بدء المكالمة بنجاح");
}

#[tokio::test]
async fn test_evaluation_call() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_create_call_with_phone_number()
        .times(1)
        .withf(|request| {
            request.voice_agent_id == "agent-eval"
                && request.params["employee_id"] == "omar_khalid"
                && request.params["employee_position"] == "Employee"
                && request.params["respondent_role"] == "manager"
                && request.params["evaluation_type"] == "employee_evaluation"
                && request.params["evaluation_prompt"]
                    .as_str()
                    .is_some_and(|s| s.contains("أنت تتحدث مع شخص هو مديرهم."))
        })
        .returning(|_| Ok(json!({ "success": true, "data": { "id": "job-8" } })));

    let mut config = Config::default();
    config.hamsa.voice_agent_id = Some("agent-eval".to_string());
    let base = serve(state(voice, completion(Ok("{}"), 0), config)).await;

    let (status, body) = post_json(
        &base,
        "/api/hamsa/evaluation-call",
        json!({ "employeeName": "Omar Khalid", "contactName": "Sara" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Employee name, contact name, and phone number are required");

    let (status, body) = post_json(
        &base,
        "/api/hamsa/evaluation-call",
        json!({
            "employeeName": "Omar Khalid",
            "contactName": "Sara",
            "contactPhone": "+96890000000",
            "contactRole": "manager",
            "language": "ar",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["jobId"], "job-8");
    assert_eq!(body["employeeId"], "omar_khalid");
    assert_eq!(body["message"], "Evaluation call initiated for Sara");
}

#[tokio::test]
async fn test_evaluation_call_without_voice_agent() {
    let base = serve(state(MockVoiceProvider::new(), completion(Ok("{}"), 0), Config::default())).await;
    let (status, body) = post_json(
        &base,
        "/api/hamsa/evaluation-call",
        json!({ "employeeName": "Omar", "contactName": "Sara", "contactPhone": "+96890000000" }),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "HAMSA_VOICE_AGENT_ID is not configured");
}

#[tokio::test]
async fn test_hamsa_recordings_and_live_calls() {
    let mut voice = MockVoiceProvider::new();
    voice.expect_get_jobs().times(2).returning(|filter| {
        let jobs = if filter.status == Some(JobStatus::Completed) {
            json!([
                { "id": "job-1", "url": "https://cdn.example/1.mp3", "callDuration": 130 },
                { "id": "job-2" },
            ])
        } else {
            assert_eq!(filter.take, 100);
            json!([
                { "id": "job-3", "title": "Ali|+97311111111", "status": "RUNNING", "createdAt": "2025-03-01T10:00:00Z" },
                { "id": "job-4", "status": "COMPLETED" },
            ])
        };
        Ok(json!({ "data": { "jobs": jobs } }))
    });
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/api/hamsa/recordings").await;
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["recordingUrl"], "https://cdn.example/1.mp3");
    assert_eq!(body["data"][0]["duration"], "02:10");

    let (status, body) = get_json(&base, "/api/hamsa/live-calls").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 1);
    assert_eq!(body["liveCalls"][0]["customerName"], "Ali");
    assert_eq!(body["liveCalls"][0]["phoneNumber"], "+97311111111");
    assert_eq!(body["liveCalls"][0]["createdAt"], "2025-03-01T10:00:00Z");
}

#[tokio::test]
async fn test_hamsa_analytics() {
    let mut voice = MockVoiceProvider::new();
    voice
        .expect_get_statistics_numbers()
        .times(1)
        .withf(|start, end| end - start == 30 * 24 * 60 * 60 * 1000)
        .returning(|_, _| {
            Ok(json!({
                "data": {
                    "requests": { "value": "10" },
                    "media": { "value": 25 },
                    "credits": { "value": 3 },
                }
            }))
        });
    voice.expect_get_jobs().times(1).returning(|filter| {
        assert_eq!(filter.take, 1000);
        Ok(json!({ "data": { "jobs": [{ "status": "PENDING" }, { "status": "ERROR" }] } }))
    });
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/api/hamsa/analytics").await;
    assert_eq!(status, 200);
    assert_eq!(body["totalCalls"], 10);
    assert_eq!(body["activeCalls"], 1);
    assert_eq!(body["failedCalls"], 1);
    assert_eq!(body["totalDuration"], 1500);
    assert_eq!(body["averageDuration"], 150);
    assert_eq!(body["successRate"], 0.0);
    assert_eq!(body["totalCost"], 3.0);
}

#[tokio::test]
async fn test_hamsa_analytics_statistics_failure() {
    let mut voice = MockVoiceProvider::new();
    voice.expect_get_statistics_numbers().returning(|_, _| {
        Err(EvalError::Upstream {
            service: Service::VoiceProvider,
            status: 403,
            body: "forbidden".to_string(),
        })
    });
    voice
        .expect_get_jobs()
        .returning(|_| Ok(json!({ "data": { "jobs": [] } })));
    let base = serve(state(voice, completion(Ok("{}"), 0), Config::default())).await;

    let (status, body) = get_json(&base, "/api/hamsa/analytics").await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("403"));
}

#[tokio::test]
async fn test_analyze_call() {
    let base = serve(state(
        MockVoiceProvider::new(),
        completion(Ok(r#"{"overallScore": 8, "summary": "Polite caller."}"#), 1),
        Config::default(),
    ))
    .await;

    let (status, body) = post_json(&base, "/api/gemini/analyze-call", json!({ "language": "ar" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Transcript is required");

    let (status, body) = post_json(
        &base,
        "/api/gemini/analyze-call",
        json!({ "transcript": "Agent: hello\nCustomer: hi", "customerName": "Ahmed", "language": "en" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["analysis"]["overallScore"], 8);
    assert_eq!(body["analysis"]["summary"], "Polite caller.");
}

#[tokio::test]
async fn test_analyze_call_mirrors_completion_status() {
    let base = serve(state(MockVoiceProvider::new(), completion(Err(503), 1), Config::default())).await;

    let (status, body) = post_json(
        &base,
        "/api/gemini/analyze-call",
        json!({ "transcript": "Agent: hello\nCustomer: hi" }),
    )
    .await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], "Completion API error: 503");
}

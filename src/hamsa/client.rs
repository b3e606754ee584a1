use super::{CallRequest, JobsFilter, VoiceProvider};
use crate::config::HamsaConfig;
use crate::error::{EvalError, Result, Service};
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde_json::{json, Value};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub struct HamsaClientBuilder {
    api_key: Option<String>,
    base_url: String,
    project_id: Option<String>,
    phone_number: Option<String>,
}

impl HamsaClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: crate::config::DEFAULT_HAMSA_BASE_URL.to_string(),
            project_id: None,
            phone_number: None,
        }
    }

    pub fn from_config(config: &HamsaConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            project_id: config.project_id.clone(),
            phone_number: config.phone_number.clone(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn build(self) -> Result<HamsaClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EvalError::Config("HAMSA_API_KEY is not set".to_string()))?;

        let http = Client::builder()
            .user_agent(crate::version::get_useragent())
            .build()?;

        Ok(HamsaClient {
            http,
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            fallback_project_id: self.project_id,
            phone_number: self.phone_number,
            project_id: OnceCell::new(),
        })
    }
}

pub struct HamsaClient {
    http: Client,
    api_key: String,
    base_url: String,
    fallback_project_id: Option<String>,
    phone_number: Option<String>,
    project_id: OnceCell<String>,
}

impl HamsaClient {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let start_time = Instant::now();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Token {}", self.api_key))
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(
            %method,
            endpoint,
            status = status.as_u16(),
            elapsed = start_time.elapsed().as_millis() as u64,
            "hamsa request"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Upstream {
                service: Service::VoiceProvider,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Resolves the project behind the api key once; later calls reuse it.
    pub async fn project_id(&self) -> Result<&str> {
        let id = self
            .project_id
            .get_or_try_init(|| async {
                let lookup = self.get_project().await.and_then(|project| {
                    project
                        .pointer("/data/id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| {
                            EvalError::Config(
                                "project id missing from /projects/by-api-key response".to_string(),
                            )
                        })
                });
                match (lookup, &self.fallback_project_id) {
                    (Ok(id), _) => {
                        info!(project_id = %id, "resolved hamsa project");
                        Ok(id)
                    }
                    (Err(e), Some(fallback)) => {
                        warn!("project lookup failed, using configured project id: {}", e);
                        Ok(fallback.clone())
                    }
                    (Err(e), None) => Err(e),
                }
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl VoiceProvider for HamsaClient {
    async fn get_job_details(&self, job_id: &str) -> Result<Value> {
        self.request(Method::GET, "/jobs", &[("jobId", job_id)], None)
            .await
    }

    async fn get_jobs(&self, filter: &JobsFilter) -> Result<Value> {
        let project_id = self.project_id().await?;
        let body = serde_json::to_value(filter).map_err(|e| EvalError::Config(e.to_string()))?;
        self.request(
            Method::POST,
            "/jobs/all",
            &[("projectId", project_id)],
            Some(&body),
        )
        .await
    }

    async fn create_call_with_phone_number(&self, request: CallRequest) -> Result<Value> {
        let phone_number = self
            .phone_number
            .as_deref()
            .ok_or_else(|| EvalError::Config("HAMSA_PHONE_NUMBER is not set".to_string()))?;

        // One conference room per call so supervisors can listen in.
        let mut params = request.params;
        params.insert(
            "conferenceName".to_string(),
            Value::String(format!("call_{}", crate::utils::unix_millis())),
        );

        let body = json!({
            "voiceAgentId": request.voice_agent_id,
            "phoneNumber": phone_number,
            "toNumber": request.to_number,
            "params": params,
        });

        let response = self
            .request(
                Method::POST,
                "/voice-agents/phone-number/call",
                &[],
                Some(&body),
            )
            .await?;
        info!(
            to_number = %request.to_number,
            job_id = ?response.pointer("/data/jobId").or_else(|| response.pointer("/data/id")),
            "hamsa call created"
        );
        Ok(response)
    }

    async fn get_project(&self) -> Result<Value> {
        self.request(Method::GET, "/projects/by-api-key", &[], None)
            .await
    }

    async fn get_statistics_numbers(&self, start_period: i64, end_period: i64) -> Result<Value> {
        let project_id = self.project_id().await?;
        let (start, end) = (start_period.to_string(), end_period.to_string());
        self.request(
            Method::GET,
            "/projects/statistics/numbers",
            &[
                ("projectId", project_id),
                ("startPeriod", start.as_str()),
                ("endPeriod", end.as_str()),
            ],
            None,
        )
        .await
    }
}

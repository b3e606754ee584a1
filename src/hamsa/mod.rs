use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod client;
pub mod types;

pub use client::{HamsaClient, HamsaClientBuilder};
pub use types::{CallRequest, JobStatus, JobsFilter, SortDirection, SortSpec};

/// Read and write path of the voice-agent provider.
///
/// Responses are returned as loosely-typed JSON: the provider's shape drifts
/// between call types, so callers probe only the paths they need.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn get_job_details(&self, job_id: &str) -> Result<Value>;

    async fn get_jobs(&self, filter: &JobsFilter) -> Result<Value>;

    async fn create_call_with_phone_number(&self, request: CallRequest) -> Result<Value>;

    /// Project bound to the api key; doubles as the connectivity probe.
    async fn get_project(&self) -> Result<Value>;

    /// Usage totals (`requests`, `media` minutes, `credits`) for a window
    /// given in unix milliseconds.
    async fn get_statistics_numbers(&self, start_period: i64, end_period: i64) -> Result<Value>;
}

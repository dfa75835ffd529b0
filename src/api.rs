//! HTTP client for the remote job-listing API.

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{JobListing, JobsPage, NewJob};
use crate::query::JobQuery;

const JOBS_ENDPOINT: &str = "/jobs";
const CREATE_FALLBACK_MESSAGE: &str = "Failed to create job";

/// Listing response. Different API revisions name the pagination metadata
/// differently, so every known spelling is accepted and folded into `JobsPage`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJobsResponse {
    #[serde(default)]
    jobs: Vec<JobListing>,
    total: Option<u64>,
    total_jobs: Option<u64>,
    total_pages: Option<u32>,
    page: Option<u32>,
    current_page: Option<u32>,
}

impl From<RawJobsResponse> for JobsPage {
    fn from(raw: RawJobsResponse) -> Self {
        JobsPage {
            jobs: raw.jobs,
            total_items: raw.total.or(raw.total_jobs),
            total_pages: raw.total_pages,
            page: raw.page.or(raw.current_page),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreatedResponse {
    Wrapped { job: JobListing },
    Bare(JobListing),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobsClient {
    client: reqwest::Client,
    base_url: String,
}

impl JobsClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn jobs_url(&self) -> String {
        format!("{}{}", self.base_url, JOBS_ENDPOINT)
    }

    /// `{jobs_url}/{id}` with the id escaped as a single path segment.
    pub fn job_url(&self, id: &str) -> ApiResult<Url> {
        let mut url =
            Url::parse(&self.jobs_url()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .push(id);
        Ok(url)
    }

    pub async fn list_jobs(&self, query: &JobQuery) -> ApiResult<JobsPage> {
        let url = self.jobs_url();
        let pairs = query.to_pairs();
        debug!(%url, ?pairs, "fetching jobs");

        let response = self.client.get(&url).query(&pairs).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "job listing request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, "Network response was not ok"),
            });
        }

        let page = parse_jobs_page(&body)?;
        debug!(count = page.jobs.len(), total = ?page.total_items, "fetched jobs");
        Ok(page)
    }

    pub async fn get_job(&self, id: &str) -> ApiResult<JobListing> {
        let url = self.job_url(id)?;
        debug!(%url, "fetching job details");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id.to_string()));
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, "Job not found"),
            });
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn create_job(&self, job: &NewJob) -> ApiResult<JobListing> {
        let url = self.jobs_url();
        debug!(%url, title = %job.title, "creating job");

        let response = self.client.post(&url).json(job).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, "job creation rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, CREATE_FALLBACK_MESSAGE),
            });
        }

        let created: CreatedResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(match created {
            CreatedResponse::Wrapped { job } => job,
            CreatedResponse::Bare(job) => job,
        })
    }
}

pub fn parse_jobs_page(body: &str) -> ApiResult<JobsPage> {
    let raw: RawJobsResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(raw.into())
}

/// Pull the server's `message` (or `error`) out of an error body.
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

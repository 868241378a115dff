//! Remote PDF-to-markdown parsing client.
//!
//! Policy documents arrive as PDFs; a hosted parsing service converts
//! them to markdown so the header-aware chunker has real structure to
//! work with. The flow is upload, poll until the job settles, then fetch
//! the markdown result.
//!
//! Job progress is tracked with an explicit [`JobState`] machine driven
//! by [`advance`], a pure function over poll outcomes. The network layer
//! only classifies each poll response into a [`PollOutcome`]; all
//! timeout and termination logic is in `advance` and unit-testable
//! without a server.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::config::ParserConfig;

/// Why a parse attempt failed.
#[derive(Debug)]
pub enum ParseError {
    /// `LLAMA_CLOUD_API_KEY` is not set.
    MissingApiKey,
    /// The service rejected the upload or reported the job failed.
    Api(String),
    /// The job did not settle within the configured poll budget.
    Timeout { attempts: u32 },
    /// The job succeeded but produced no markdown text.
    Empty,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingApiKey => {
                write!(f, "LLAMA_CLOUD_API_KEY environment variable not set")
            }
            ParseError::Api(msg) => write!(f, "parsing service error: {msg}"),
            ParseError::Timeout { attempts } => {
                write!(f, "parse job did not complete after {attempts} polls")
            }
            ParseError::Empty => write!(f, "parse job returned no text"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Lifecycle of one parse job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Upload accepted, no poll issued yet.
    Submitted,
    /// Waiting on the service; `attempt` counts polls issued so far.
    Polling { attempt: u32 },
    /// The service reported SUCCESS.
    Succeeded,
    /// The poll budget ran out before the job settled.
    TimedOut,
    /// The service reported the job failed.
    Failed,
}

/// What one poll response said about the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    Pending,
    Failed,
}

/// What the upload call handed back: small documents can come back
/// already parsed, larger ones get queued under a job id.
enum UploadResponse {
    Markdown(String),
    Job(String),
}

/// Advance the job state machine by one poll.
///
/// Terminal states absorb further outcomes. A `Pending` outcome from the
/// final allowed attempt transitions to `TimedOut`.
pub fn advance(state: &JobState, outcome: PollOutcome, max_attempts: u32) -> JobState {
    let attempt = match state {
        JobState::Submitted => 1,
        JobState::Polling { attempt } => attempt + 1,
        terminal => return terminal.clone(),
    };

    match outcome {
        PollOutcome::Ready => JobState::Succeeded,
        PollOutcome::Failed => JobState::Failed,
        PollOutcome::Pending => {
            if attempt >= max_attempts {
                JobState::TimedOut
            } else {
                JobState::Polling { attempt }
            }
        }
    }
}

/// Client for the hosted parsing service.
pub struct ParserClient {
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
    api_key: String,
    client: reqwest::Client,
}

impl ParserClient {
    /// Build a client from configuration.
    ///
    /// Fails up front if `LLAMA_CLOUD_API_KEY` is missing, before any
    /// file is read or uploaded.
    pub fn new(config: &ParserConfig) -> Result<Self, ParseError> {
        let api_key =
            std::env::var("LLAMA_CLOUD_API_KEY").map_err(|_| ParseError::MissingApiKey)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_attempts: config.max_poll_attempts,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    /// Parse a PDF file into markdown.
    pub async fn parse_pdf(&self, path: &Path) -> Result<String, ParseError> {
        let job_id = match self.upload(path).await? {
            UploadResponse::Markdown(markdown) => {
                if markdown.trim().is_empty() {
                    return Err(ParseError::Empty);
                }
                return Ok(markdown);
            }
            UploadResponse::Job(id) => id,
        };
        let mut state = JobState::Submitted;

        loop {
            tokio::time::sleep(self.poll_interval).await;
            let outcome = self.poll(&job_id).await?;
            state = advance(&state, outcome, self.max_poll_attempts);

            match state {
                JobState::Succeeded => break,
                JobState::Failed => {
                    return Err(ParseError::Api(format!("job {job_id} failed")));
                }
                JobState::TimedOut => {
                    return Err(ParseError::Timeout {
                        attempts: self.max_poll_attempts,
                    });
                }
                JobState::Submitted | JobState::Polling { .. } => continue,
            }
        }

        self.fetch_markdown(&job_id).await
    }

    /// Upload the file. The service either answers with the parsed
    /// markdown inline or with a job id to poll.
    async fn upload(&self, path: &Path) -> Result<UploadResponse, ParseError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ParseError::Api(format!("failed to read {}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| ParseError::Api(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("result_type", "markdown");

        let resp = self
            .client
            .post(format!("{}/api/parsing/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ParseError::Api(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ParseError::Api(format!("upload failed ({status}): {body}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ParseError::Api(e.to_string()))?;

        if let Some(markdown) = json.get("markdown").and_then(|v| v.as_str()) {
            return Ok(UploadResponse::Markdown(markdown.to_string()));
        }
        json.get("id")
            .and_then(|v| v.as_str())
            .map(|id| UploadResponse::Job(id.to_string()))
            .ok_or_else(|| {
                ParseError::Api("upload response carried neither markdown nor a job id".to_string())
            })
    }

    /// Poll the job once and classify the response.
    async fn poll(&self, job_id: &str) -> Result<PollOutcome, ParseError> {
        let resp = self
            .client
            .get(format!("{}/api/parsing/job/{job_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            // Transient network trouble counts as a pending poll.
            Err(_) => return Ok(PollOutcome::Pending),
        };

        let status = resp.status();
        // Freshly created jobs can 400/404 until the service registers
        // them; treat that as still pending rather than failing.
        if status.as_u16() == 400 || status.as_u16() == 404 {
            return Ok(PollOutcome::Pending);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ParseError::Api(format!("poll failed ({status}): {body}")));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ParseError::Api(e.to_string()))?;
        let job_status = json.get("status").and_then(|v| v.as_str()).unwrap_or("");

        Ok(match job_status {
            "SUCCESS" => PollOutcome::Ready,
            "ERROR" | "CANCELED" => PollOutcome::Failed,
            _ => PollOutcome::Pending,
        })
    }

    /// Fetch the markdown result of a succeeded job.
    async fn fetch_markdown(&self, job_id: &str) -> Result<String, ParseError> {
        let resp = self
            .client
            .get(format!(
                "{}/api/parsing/job/{job_id}/result/markdown",
                self.base_url
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ParseError::Api(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ParseError::Api(format!(
                "result fetch failed ({status}): {body}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ParseError::Api(e.to_string()))?;
        let markdown = json
            .get("markdown")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        if markdown.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(markdown)
    }
}

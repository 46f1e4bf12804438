use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::error::{GenError, Result};
use crate::signal;
use crate::types::{GeneratedImage, GenerationRequest, GenerationResult, QueuedJob};
use crate::workflow;

/// Delay between history polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// Wall-clock budget for the whole polling phase.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const SUBMIT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const HISTORY_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async client for submitting text-to-image jobs to a ComfyUI server.
///
/// A single `generate` call hydrates the configured workflow template with
/// the request's parameters, queues it via `/prompt`, polls `/history` until
/// outputs appear, and resolves the reported images into `/view` URLs.
///
/// # Example
/// ```no_run
/// use comfy_gen::{GenClient, GenerationRequest};
///
/// # async fn example() -> comfy_gen::Result<()> {
/// let client = GenClient::new("http://127.0.0.1:8188");
///
/// let result = client
///     .generate(&GenerationRequest::new("a sunset over mountains").size(1024, 1024))
///     .await?;
///
/// for image in &result.images {
///     println!("{}", image.url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GenClient {
    http: Client,
    base_url: String,
    workflow_config: WorkflowConfig,
    poll_interval: Duration,
    timeout: Duration,
}

impl GenClient {
    /// Create a new client pointing at the given ComfyUI endpoint, using the
    /// default workflow configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize(base_url.into()),
            workflow_config: WorkflowConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, timeouts, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Use a specific workflow configuration instead of the default.
    pub fn with_workflow_config(mut self, config: WorkflowConfig) -> Self {
        self.workflow_config = config;
        self
    }

    /// Set the delay between history polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the wall-clock budget for waiting on job results.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the active workflow configuration.
    pub fn workflow_config(&self) -> &WorkflowConfig {
        &self.workflow_config
    }

    // ── Generation ──────────────────────────────────────────────────

    /// Run a full generation: hydrate, submit, poll, extract.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.generate_with_signal(request, CancellationToken::new())
            .await
    }

    /// Like [`GenClient::generate`], racing every network operation against
    /// the supplied cancellation token. Cancelling the token aborts the
    /// in-flight request and fails with [`GenError::Cancelled`].
    pub async fn generate_with_signal(
        &self,
        request: &GenerationRequest,
        signal: CancellationToken,
    ) -> Result<GenerationResult> {
        if self.base_url.is_empty() {
            return Err(GenError::InvalidRequest(
                "ComfyUI endpoint URL must not be empty".to_string(),
            ));
        }
        if request.prompt.trim().is_empty() {
            return Err(GenError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }

        let cancel = signal::merge_tokens([signal]);
        // Released on scope exit, success or error, so the merge watcher
        // never outlives the call.
        let _cleanup = cancel.clone().drop_guard();

        let template = run_cancellable(
            &cancel,
            workflow::load_template(&self.workflow_config.workflow_path),
        )
        .await?;
        let hydrated = workflow::hydrate(&template, request, &self.workflow_config);

        let client_id = Uuid::new_v4().to_string();
        let queued = run_cancellable(&cancel, self.queue_prompt(&hydrated, &client_id)).await?;
        debug!(prompt_id = %queued.prompt_id, number = queued.number, "workflow queued");

        let entry = self.wait_for_outputs(&queued.prompt_id, &cancel).await?;
        let images = extract_images(&self.base_url, &entry)?;
        debug!(prompt_id = %queued.prompt_id, count = images.len(), "outputs ready");

        if images.is_empty() {
            return Err(GenError::EmptyResult);
        }

        Ok(GenerationResult {
            prompt_id: queued.prompt_id,
            images,
            raw_history: entry,
        })
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Queue a hydrated workflow for execution.
    async fn queue_prompt(&self, workflow: &Value, client_id: &str) -> Result<QueuedJob> {
        let url = format!("{}/prompt", self.base_url);
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let resp = self
            .http
            .post(&url)
            .timeout(SUBMIT_REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: format!(
                    "Cannot connect to ComfyUI at {} \u{2014} is the worker running?",
                    self.base_url
                ),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::Submit { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| GenError::Network {
            context: "Failed to parse ComfyUI /prompt response".into(),
            source: e,
        })?;

        if let Some(errors) = json.get("node_errors").and_then(|e| e.as_object()) {
            if !errors.is_empty() {
                return Err(GenError::NodeErrors(
                    serde_json::to_string_pretty(errors).unwrap_or_default(),
                ));
            }
        }

        serde_json::from_value(json)
            .map_err(|_| GenError::InvalidResponse("Response missing prompt_id".into()))
    }

    // ── Polling ─────────────────────────────────────────────────────

    /// Poll `/history` until the job reports outputs, the budget elapses, or
    /// the signal fires.
    async fn wait_for_outputs(
        &self,
        prompt_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let start = Instant::now();
        loop {
            if start.elapsed() >= self.timeout {
                return Err(GenError::Timeout);
            }

            if let Some(entry) = run_cancellable(cancel, self.fetch_history(prompt_id)).await? {
                return Ok(entry);
            }

            run_cancellable(cancel, async {
                tokio::time::sleep(self.poll_interval).await;
                Ok(())
            })
            .await?;
        }
    }

    /// Fetch the history entry for a prompt. Returns `None` while the job is
    /// not yet known (404) or has no outputs yet.
    async fn fetch_history(&self, prompt_id: &str) -> Result<Option<Value>> {
        let url = format!("{}/history/{}", self.base_url, prompt_id);
        let resp = self
            .http
            .get(&url)
            .timeout(HISTORY_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GenError::Network {
                context: "Failed to fetch ComfyUI history".into(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenError::History { status, body });
        }

        let payload: Value = resp.json().await.map_err(|e| GenError::Network {
            context: "Failed to parse ComfyUI history response".into(),
            source: e,
        })?;

        match payload.get(prompt_id) {
            Some(entry) if entry.get("outputs").is_some_and(|o| !o.is_null()) => {
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    // ── Image download ──────────────────────────────────────────────

    /// Download a resolved output image. Returns raw bytes.
    pub async fn fetch_image(&self, image: &GeneratedImage) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(&image.url)
            .timeout(IMAGE_REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| GenError::Network {
                context: format!("Failed to fetch image {} from ComfyUI", image.filename),
                source: e,
            })?;

        let bytes = resp.bytes().await.map_err(|e| GenError::Network {
            context: "Failed to read image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

/// Race `operation` against the cancellation token. A dropped request future
/// aborts its underlying connection.
async fn run_cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(GenError::Cancelled),
        result = operation => result,
    }
}

/// Resolve every image reference in a history entry into a fetchable `/view`
/// URL, preserving the server-reported order of nodes and images.
fn extract_images(base_url: &str, entry: &Value) -> Result<Vec<GeneratedImage>> {
    let mut images = Vec::new();

    let Some(outputs) = entry.get("outputs").and_then(|o| o.as_object()) else {
        return Ok(images);
    };

    for (_node_id, node_output) in outputs {
        let Some(node_images) = node_output.get("images").and_then(|i| i.as_array()) else {
            continue;
        };
        for image in node_images {
            let Some(filename) = image.get("filename").and_then(|f| f.as_str()) else {
                continue;
            };
            let image_type = image.get("type").and_then(|t| t.as_str());
            let subfolder = image
                .get("subfolder")
                .and_then(|s| s.as_str())
                .filter(|s| !s.is_empty());

            let mut params = vec![
                ("filename", filename),
                ("type", image_type.unwrap_or("output")),
            ];
            if let Some(subfolder) = subfolder {
                params.push(("subfolder", subfolder));
            }

            let url = reqwest::Url::parse_with_params(&format!("{}/view", base_url), &params)
                .map_err(|e| GenError::InvalidResponse(format!("Bad image URL: {}", e)))?;

            images.push(GeneratedImage {
                url: url.to_string(),
                filename: filename.to_string(),
                subfolder: subfolder.map(str::to_string),
                image_type: image_type.map(str::to_string),
            });
        }
    }

    Ok(images)
}

// HTTP client for a REST experiment tracking service
//
// API contract:
//
//   POST /api/runs                    body: SessionInit        -> { run_id }
//   POST /api/runs/{id}/metrics       body: { name, step_metric }
//   POST /api/runs/{id}/log           body: { data, commit }
//   POST /api/runs/{id}/files         body: { name, policy, content_base64 }
//   POST /api/runs/{id}/finish
//
// All calls block. Failures are returned immediately; nothing is retried.

use base64::Engine;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::tracking::{SavePolicy, SessionInit, TrackingService, TrackingSession};
use crate::config::constants::{DEFAULT_REMOTE_TIMEOUT_SECS, STAGING_DIR_NAME};
use crate::config::{RemoteConfig, RemoteMode};
use crate::error::{LoggerError, Result};
use crate::metrics::MetricRecord;

/// Tracking service reached over HTTP.
pub struct HttpTrackingService {
    endpoint: String,
    api_key: Option<String>,
    staging_root: PathBuf,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CreateRunResponse {
    run_id: String,
}

#[derive(Debug, Serialize)]
struct DefineMetricRequest<'a> {
    name: &'a str,
    step_metric: &'a str,
}

#[derive(Debug, Serialize)]
struct LogRequest<'a> {
    data: &'a MetricRecord,
    commit: bool,
}

#[derive(Debug, Serialize)]
struct FileUploadRequest {
    name: String,
    policy: SavePolicy,
    content_base64: String,
}

impl HttpTrackingService {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS))
    }

    fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
            staging_root: default_staging_root(),
            client,
        })
    }

    /// Build from the `[remote]` config section. An endpoint is required
    /// unless the remote mode is `disabled`.
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        let endpoint = match (&remote.endpoint, remote.mode) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, RemoteMode::Disabled) => String::new(),
            (None, _) => {
                return Err(LoggerError::config(
                    "remote.endpoint must be set for remote logging",
                ))
            }
        };

        let mut service =
            Self::with_timeout(endpoint, Duration::from_secs(remote.timeout_secs))?;
        service.api_key = remote.api_key.clone();
        if let Some(root) = &remote.staging_dir {
            service.staging_root = root.clone();
        }
        Ok(service)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TrackingService for HttpTrackingService {
    fn init(&self, init: &SessionInit) -> Result<Box<dyn TrackingSession>> {
        if init.mode == RemoteMode::Disabled {
            let run_id = Uuid::new_v4().to_string();
            let run_dir = self.staging_root.join(format!("{}-{}", init.name, run_id));
            fs::create_dir_all(&run_dir)?;
            debug!(run_dir = %run_dir.display(), "Remote mode disabled, using offline session");
            return Ok(Box::new(OfflineSession { run_dir }));
        }

        let url = format!("{}/api/runs", self.endpoint);
        let created: CreateRunResponse =
            post_json(&self.client, self.api_key.as_deref(), &url, init)?.json()?;

        let run_dir = self
            .staging_root
            .join(format!("{}-{}", init.name, created.run_id));
        fs::create_dir_all(&run_dir)?;
        debug!(run_id = %created.run_id, "Opened tracking session");

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            run_url: format!("{}/api/runs/{}", self.endpoint, created.run_id),
            run_dir,
        }))
    }
}

/// A run open on the HTTP service.
struct HttpSession {
    client: Client,
    api_key: Option<String>,
    run_url: String,
    run_dir: PathBuf,
}

impl HttpSession {
    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = format!("{}/{}", self.run_url, path);
        post_json(&self.client, self.api_key.as_deref(), &url, body)?;
        Ok(())
    }
}

impl TrackingSession for HttpSession {
    fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn define_metric(&mut self, name: &str, step_metric: &str) -> Result<()> {
        self.post("metrics", &DefineMetricRequest { name, step_metric })
    }

    fn log(&mut self, record: &MetricRecord, commit: bool) -> Result<()> {
        self.post(
            "log",
            &LogRequest {
                data: record,
                commit,
            },
        )
    }

    fn save_file(&mut self, path: &Path, base_path: &Path, policy: SavePolicy) -> Result<()> {
        let name = path
            .strip_prefix(base_path)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();
        let contents = fs::read(path)?;
        self.post(
            "files",
            &FileUploadRequest {
                name,
                policy,
                content_base64: base64::engine::general_purpose::STANDARD.encode(contents),
            },
        )
    }

    fn finish(&mut self) -> Result<()> {
        self.post("finish", &serde_json::json!({}))
    }
}

/// Session used when the remote mode is `disabled`: files are staged,
/// nothing is sent.
struct OfflineSession {
    run_dir: PathBuf,
}

impl TrackingSession for OfflineSession {
    fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn define_metric(&mut self, _name: &str, _step_metric: &str) -> Result<()> {
        Ok(())
    }

    fn log(&mut self, _record: &MetricRecord, _commit: bool) -> Result<()> {
        Ok(())
    }

    fn save_file(&mut self, _path: &Path, _base_path: &Path, _policy: SavePolicy) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    api_key: Option<&str>,
    url: &str,
    body: &T,
) -> Result<Response> {
    debug!("POST {}", url);

    let mut request = client.post(url).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .map_err(|e| LoggerError::Remote(format!("failed to reach tracking service: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(LoggerError::Remote(format!(
            "tracking service error {} for {}: {}",
            status, url, body
        )));
    }
    Ok(response)
}

fn default_staging_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(STAGING_DIR_NAME)
}

// Project-wide constants
//
// Centralised here so default paths and environment variable names have one
// source of truth.

/// Default parent directory for local runs, relative to the working directory.
pub const DEFAULT_LOCAL_BASE_DIR: &str = "runs";

/// Environment variable consulted when `remote.api_key` is not set.
pub const API_KEY_ENV: &str = "RLBENCH_API_KEY";

/// Request timeout for the tracking service.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Directory name under the user's data dir that holds remote staging dirs.
pub const STAGING_DIR_NAME: &str = "rlbench";

/// Extension of the per-group metric streams under `metrics/`.
pub const METRICS_FILE_EXT: &str = "csv";

//! Shared constants for endpoints, limits and wire names.

/// Bytes in one mebibyte. Size limits are configured in MiB.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-file ceiling used when `MAX_FILE_SIZE_MB` is not set.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 20;

/// Backend used when the origin host is a loopback name.
pub const LOCAL_BASE_URL: &str = "http://localhost:3000";

/// Backend used for every other origin host.
pub const REMOTE_BASE_URL: &str = "https://smart-shipping.onrender.com";

/// Host names that resolve to [`LOCAL_BASE_URL`].
pub const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// `GET` path returning the session descriptor.
pub const SESSION_URL_PATH: &str = "/session-url";

/// `POST` prefix for uploads; the session id is appended as the last segment.
pub const UPLOAD_PATH_PREFIX: &str = "/upload";

/// Multipart field name, repeated once per file.
pub const UPLOAD_FIELD_NAME: &str = "files";

/// How long a Succeeded/Failed outcome stays visible before the task reads as Idle.
pub const DEFAULT_RESULT_DISPLAY_MS: u64 = 3000;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Content type for files whose extension is not recognised.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

//! Configuration module
//!
//! Client configuration: which backend to talk to, the per-file ceiling and a few
//! timing knobs. Values come from the environment (a `.env` file is honoured) and
//! may be overridden by the command line.

use std::env;
use std::time::Duration;

use crate::constants::{
    BYTES_PER_MB, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RESULT_DISPLAY_MS, LOCAL_BASE_URL, LOOPBACK_HOSTS, REMOTE_BASE_URL,
};

/// Pick the backend for the host the client runs on: loopback hosts talk to the
/// local development server, everything else to the hosted one.
pub fn resolve_base_url(host: &str) -> &'static str {
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    if LOOPBACK_HOSTS
        .iter()
        .any(|loopback| loopback.eq_ignore_ascii_case(host))
    {
        LOCAL_BASE_URL
    } else {
        REMOTE_BASE_URL
    }
}

/// Convert a MiB ceiling to bytes, rejecting values that do not fit in a `u64`.
pub fn mb_to_bytes(mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {} MiB", mb))
}

/// Host name of the machine, or "localhost" when it cannot be read.
pub fn detect_origin_host() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub max_file_size_bytes: u64,
    pub request_timeout_secs: u64,
    pub result_display_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE_URL.to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * BYTES_PER_MB,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            result_display_ms: DEFAULT_RESULT_DISPLAY_MS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let base_url = match env::var("SMARTSHIP_API_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => {
                let host =
                    env::var("SMARTSHIP_ORIGIN_HOST").unwrap_or_else(|_| detect_origin_host());
                resolve_base_url(&host).to_string()
            }
        };

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE_MB must be a whole number of MiB"))?;

        let config = ClientConfig {
            base_url,
            max_file_size_bytes: mb_to_bytes(max_file_size_mb)?,
            request_timeout_secs: env::var("SMARTSHIP_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            result_display_ms: env::var("SMARTSHIP_RESULT_DISPLAY_MS")
                .unwrap_or_else(|_| DEFAULT_RESULT_DISPLAY_MS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RESULT_DISPLAY_MS),
        };

        tracing::debug!(
            base_url = %config.base_url,
            max_file_size_bytes = config.max_file_size_bytes,
            "Loaded client configuration"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_file_size_mb(mut self, mb: u64) -> Result<Self, anyhow::Error> {
        self.max_file_size_bytes = mb_to_bytes(mb)?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_millis(self.result_display_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_loopback_hosts() {
        assert_eq!(resolve_base_url("localhost"), LOCAL_BASE_URL);
        assert_eq!(resolve_base_url("127.0.0.1"), LOCAL_BASE_URL);
        assert_eq!(resolve_base_url("[::1]"), LOCAL_BASE_URL);
        assert_eq!(resolve_base_url("LocalHost"), LOCAL_BASE_URL);
    }

    #[test]
    fn test_resolve_remote_hosts() {
        assert_eq!(resolve_base_url("smart-shipping.example"), REMOTE_BASE_URL);
        assert_eq!(resolve_base_url("192.168.1.20"), REMOTE_BASE_URL);
        assert_eq!(resolve_base_url(""), REMOTE_BASE_URL);
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default()
            .with_max_file_size_mb(0)
            .unwrap()
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_base_url("ftp://example.com")
            .validate()
            .is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::default()
            .with_base_url("https://files.example")
            .with_max_file_size_mb(10)
            .unwrap();
        assert_eq!(config.base_url, "https://files.example");
        assert_eq!(config.max_file_size_bytes, 10 * BYTES_PER_MB);
        assert_eq!(config.result_display(), Duration::from_millis(3000));
    }

    #[test]
    fn test_oversized_ceiling_is_rejected() {
        let max_mb = u64::MAX / BYTES_PER_MB;
        assert_eq!(mb_to_bytes(max_mb).unwrap(), max_mb * BYTES_PER_MB);

        for mb in [max_mb + 1, 1u64 << 44, (1u64 << 44) + 1, u64::MAX] {
            let err = ClientConfig::default()
                .with_max_file_size_mb(mb)
                .unwrap_err();
            assert!(err.to_string().contains("too large"), "{}", err);
        }
    }
}

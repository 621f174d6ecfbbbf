//! Configuration types and loading
//!
//! All settings are read once at startup, either from a TOML file named by
//! `KARAOKE_CONFIG` or from individual environment variables, and validated
//! before any service is built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming a TOML configuration file
pub const CONFIG_FILE_VAR: &str = "KARAOKE_CONFIG";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub storage: StorageConfig,
    /// Notifications are disabled when absent
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub media: MediaConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Request body limit for multipart uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

/// Object storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// AWS S3 or an S3-compatible service
    S3 {
        bucket: String,
        /// Falls back to the AWS provider chain when unset
        #[serde(default)]
        region: Option<String>,
        /// Custom endpoint for S3-compatible services (path-style addressing)
        #[serde(default)]
        endpoint: Option<String>,
        /// Overrides the default virtual-hosted URL form
        #[serde(default)]
        public_base_url: Option<String>,
    },
    /// Files on local disk, served elsewhere under `public_base_url`
    Local {
        root: PathBuf,
        public_base_url: String,
    },
    /// In-process storage, lost on restart
    Memory { public_base_url: String },
}

/// How the SMTP session is secured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465)
    Tls,
    /// STARTTLS upgrade (usually port 587)
    #[default]
    StartTls,
    /// Plaintext, for local relays and test servers
    None,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tls" | "smtps" => Ok(SmtpSecurity::Tls),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "none" | "plain" => Ok(SmtpSecurity::None),
            other => Err(format!("unknown SMTP security mode '{}'", other)),
        }
    }
}

/// SMTP settings for the notifier
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Sender mailbox, e.g. `Karaoke <noreply@example.com>`
    pub from: String,
    #[serde(default)]
    pub security: SmtpSecurity,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("security", &self.security)
            .finish()
    }
}

/// Transcoding engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    /// Parent directory for per-call arenas (system temp dir when unset)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            work_dir: None,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
        }
    }
}

impl MediaConfig {
    /// Directory arenas are created in
    pub fn work_root(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_max_concurrent_jobs() -> usize {
    DEFAULT_MAX_CONCURRENT_JOBS
}

impl AppConfig {
    /// Load and validate configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_FILE_VAR) {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_toml_file(Path::new(path.trim()))?
            }
            _ => Self::from_lookup(|key| std::env::var(key).ok())?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build configuration from environment-style variables
    ///
    /// `lookup` returns the raw value of a variable; blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

        let server = ServerConfig {
            bind_addr: match get("BIND_ADDR") {
                Some(v) => parse_var("BIND_ADDR", &v)?,
                None => default_bind_addr(),
            },
            max_upload_bytes: match get("MAX_UPLOAD_BYTES") {
                Some(v) => parse_var("MAX_UPLOAD_BYTES", &v)?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
        };

        let backend = get("STORAGE_BACKEND").unwrap_or_else(|| "s3".to_string());
        let storage = match backend.to_ascii_lowercase().as_str() {
            "s3" => StorageConfig::S3 {
                bucket: require("S3_BUCKET")?,
                region: get("AWS_REGION"),
                endpoint: get("S3_ENDPOINT"),
                public_base_url: get("PUBLIC_BASE_URL"),
            },
            "local" => StorageConfig::Local {
                root: PathBuf::from(require("LOCAL_STORAGE_DIR")?),
                public_base_url: require("PUBLIC_BASE_URL")?,
            },
            "memory" => StorageConfig::Memory {
                public_base_url: get("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:3000/files".to_string()),
            },
            other => {
                return Err(ConfigError::invalid(
                    "STORAGE_BACKEND",
                    format!("unknown backend '{}'", other),
                ))
            }
        };

        // SMTP is all-or-nothing, keyed on SMTP_HOST
        let smtp = match get("SMTP_HOST") {
            None => None,
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", &require("SMTP_PORT")?)?,
                user: require("SMTP_USER")?,
                password: require("SMTP_PASSWORD")?,
                from: require("SMTP_FROM")?,
                security: match get("SMTP_SECURITY") {
                    Some(v) => v
                        .parse()
                        .map_err(|e: String| ConfigError::invalid("SMTP_SECURITY", e))?,
                    None => SmtpSecurity::default(),
                },
            }),
        };

        let media = MediaConfig {
            ffmpeg_path: get("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_ffmpeg_path),
            ffprobe_path: get("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_ffprobe_path),
            work_dir: get("MEDIA_WORK_DIR").map(PathBuf::from),
            max_concurrent_jobs: match get("MAX_CONCURRENT_JOBS") {
                Some(v) => parse_var("MAX_CONCURRENT_JOBS", &v)?,
                None => DEFAULT_MAX_CONCURRENT_JOBS,
            },
        };

        Ok(Self {
            server,
            storage,
            smtp,
            media,
        })
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_upload_bytes",
                "must be greater than zero",
            ));
        }

        match &self.storage {
            StorageConfig::S3 {
                bucket,
                region,
                endpoint,
                public_base_url,
            } => {
                if bucket.trim().is_empty() {
                    return Err(ConfigError::Missing("storage.bucket".to_string()));
                }
                if matches!(region, Some(r) if r.trim().is_empty()) {
                    return Err(ConfigError::invalid("storage.region", "must not be blank"));
                }
                if let Some(endpoint) = endpoint {
                    check_http_url("storage.endpoint", endpoint)?;
                }
                if let Some(base) = public_base_url {
                    check_http_url("storage.public_base_url", base)?;
                }
            }
            StorageConfig::Local {
                root,
                public_base_url,
            } => {
                if root.as_os_str().is_empty() {
                    return Err(ConfigError::Missing("storage.root".to_string()));
                }
                check_http_url("storage.public_base_url", public_base_url)?;
            }
            StorageConfig::Memory { public_base_url } => {
                check_http_url("storage.public_base_url", public_base_url)?;
            }
        }

        if let Some(smtp) = &self.smtp {
            if smtp.host.trim().is_empty() {
                return Err(ConfigError::Missing("smtp.host".to_string()));
            }
            if smtp.port == 0 {
                return Err(ConfigError::invalid("smtp.port", "must be greater than zero"));
            }
            smtp.from
                .parse::<lettre::message::Mailbox>()
                .map_err(|e| ConfigError::invalid("smtp.from", e.to_string()))?;
        }

        if self.media.max_concurrent_jobs == 0 {
            return Err(ConfigError::invalid(
                "media.max_concurrent_jobs",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{}': {}", value, e)))
}

fn check_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("'{}' is not an http(s) URL", value)))
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Startup configuration for the orchestration core.
//!
//! This crate provides [`OrchestratorConfig`] — the recognised options a
//! host process reads at startup — together with TOML loading, environment
//! overrides, semantic validation producing advisory [`ConfigWarning`]s, and
//! overlay merging.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// The federated-registry token expiry is unusually large.
    LargeTokenExpiry {
        /// Configured expiry, in seconds.
        secs: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTokenExpiry { secs } => {
                write!(f, "federated-registry token expiry is unusually large ({secs}s)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config type
// ---------------------------------------------------------------------------

/// Top-level startup configuration for the orchestration core.
///
/// Carries exactly the recognised options named by the spec this crate
/// implements: API hostname, federated-registry token expiry, query/log
/// page sizes, and the two MCP surface knobs a host process threads
/// through to the (out-of-scope) external MCP layer.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// This service's own API hostname, used to recognise `Local` module
    /// sources (a source string whose host segment matches this value).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_hostname: Option<String>,

    /// Federated-registry token expiry, in seconds. Default 60.
    #[serde(default = "default_token_expiry_secs")]
    pub federated_registry_token_expiry_secs: u64,

    /// Maximum number of items a single paginated query may return.
    /// Default 100.
    #[serde(default = "default_max_query_page_size")]
    pub max_query_page_size: u32,

    /// Default size, in bytes, of one log page when a caller doesn't
    /// specify one. Default 10 KiB.
    #[serde(default = "default_log_page_size_bytes")]
    pub default_log_page_size_bytes: u32,

    /// Maximum size, in bytes, a caller may request for one log page.
    /// Default 50,000.
    #[serde(default = "max_log_page_size_bytes")]
    pub max_log_page_size_bytes: u32,

    /// Grace period, in seconds, between a graceful cancel request and the
    /// point at which an unprivileged caller may force-cancel. Default 30.
    #[serde(default = "default_cancel_grace_period_secs")]
    pub cancel_grace_period_secs: u64,

    /// Whether the external MCP tool surface is restricted to read-only
    /// operations. This core does not implement the MCP surface itself —
    /// it only carries this flag for the host process to apply.
    #[serde(default = "default_mcp_read_only")]
    pub mcp_read_only: bool,

    /// Toolset names the external MCP layer should enable.
    #[serde(default)]
    pub mcp_enabled_toolsets: Vec<String>,
}

fn default_token_expiry_secs() -> u64 {
    60
}

fn default_max_query_page_size() -> u32 {
    100
}

fn default_log_page_size_bytes() -> u32 {
    10 * 1024
}

fn max_log_page_size_bytes() -> u32 {
    50_000
}

fn default_cancel_grace_period_secs() -> u64 {
    30
}

fn default_mcp_read_only() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_hostname: None,
            federated_registry_token_expiry_secs: default_token_expiry_secs(),
            max_query_page_size: default_max_query_page_size(),
            default_log_page_size_bytes: default_log_page_size_bytes(),
            max_log_page_size_bytes: max_log_page_size_bytes(),
            cancel_grace_period_secs: default_cancel_grace_period_secs(),
            mcp_read_only: default_mcp_read_only(),
            mcp_enabled_toolsets: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Threshold above which a token expiry generates a warning rather than an
/// error — a long-lived federated-registry token is unusual but not unsafe
/// on its own.
const LARGE_TOKEN_EXPIRY_THRESHOLD_SECS: u64 = 3_600;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`OrchestratorConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`OrchestratorConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => OrchestratorConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`OrchestratorConfig`].
pub fn parse_toml(content: &str) -> Result<OrchestratorConfig, ConfigError> {
    toml::from_str::<OrchestratorConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `ORC_API_HOSTNAME`
/// - `ORC_FEDERATED_REGISTRY_TOKEN_EXPIRY_SECS`
/// - `ORC_MAX_QUERY_PAGE_SIZE`
/// - `ORC_DEFAULT_LOG_PAGE_SIZE_BYTES`
/// - `ORC_MAX_LOG_PAGE_SIZE_BYTES`
/// - `ORC_CANCEL_GRACE_PERIOD_SECS`
/// - `ORC_MCP_READ_ONLY`
/// - `ORC_MCP_ENABLED_TOOLSETS` (comma-separated)
pub fn apply_env_overrides(config: &mut OrchestratorConfig) {
    if let Ok(val) = std::env::var("ORC_API_HOSTNAME") {
        config.api_hostname = Some(val);
    }
    if let Ok(val) = std::env::var("ORC_FEDERATED_REGISTRY_TOKEN_EXPIRY_SECS")
        && let Ok(n) = val.parse()
    {
        config.federated_registry_token_expiry_secs = n;
    }
    if let Ok(val) = std::env::var("ORC_MAX_QUERY_PAGE_SIZE")
        && let Ok(n) = val.parse()
    {
        config.max_query_page_size = n;
    }
    if let Ok(val) = std::env::var("ORC_DEFAULT_LOG_PAGE_SIZE_BYTES")
        && let Ok(n) = val.parse()
    {
        config.default_log_page_size_bytes = n;
    }
    if let Ok(val) = std::env::var("ORC_MAX_LOG_PAGE_SIZE_BYTES")
        && let Ok(n) = val.parse()
    {
        config.max_log_page_size_bytes = n;
    }
    if let Ok(val) = std::env::var("ORC_CANCEL_GRACE_PERIOD_SECS")
        && let Ok(n) = val.parse()
    {
        config.cancel_grace_period_secs = n;
    }
    if let Ok(val) = std::env::var("ORC_MCP_READ_ONLY")
        && let Ok(b) = val.parse()
    {
        config.mcp_read_only = b;
    }
    if let Ok(val) = std::env::var("ORC_MCP_ENABLED_TOOLSETS") {
        config.mcp_enabled_toolsets = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (zero-valued sizes, default page size exceeding the max) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back as
/// warnings.
pub fn validate_config(config: &OrchestratorConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.federated_registry_token_expiry_secs == 0 {
        errors.push("federated_registry_token_expiry_secs must be greater than zero".into());
    } else if config.federated_registry_token_expiry_secs > LARGE_TOKEN_EXPIRY_THRESHOLD_SECS {
        warnings.push(ConfigWarning::LargeTokenExpiry {
            secs: config.federated_registry_token_expiry_secs,
        });
    }

    if config.max_query_page_size == 0 {
        errors.push("max_query_page_size must be greater than zero".into());
    }

    if config.default_log_page_size_bytes == 0 {
        errors.push("default_log_page_size_bytes must be greater than zero".into());
    }
    if config.max_log_page_size_bytes == 0 {
        errors.push("max_log_page_size_bytes must be greater than zero".into());
    }
    if config.default_log_page_size_bytes > config.max_log_page_size_bytes {
        errors.push(format!(
            "default_log_page_size_bytes ({}) exceeds max_log_page_size_bytes ({})",
            config.default_log_page_size_bytes, config.max_log_page_size_bytes
        ));
    }

    if config.cancel_grace_period_secs == 0 {
        errors.push("cancel_grace_period_secs must be greater than zero".into());
    }

    if config.api_hostname.is_none() {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "api_hostname".into(),
            hint: "module source strings will never be recognised as Local".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Scalar fields in `overlay` take precedence
/// over `base`; `mcp_enabled_toolsets` from `overlay` replaces (not
/// appends to) `base`'s list when non-empty.
pub fn merge_configs(base: OrchestratorConfig, overlay: OrchestratorConfig) -> OrchestratorConfig {
    let default = OrchestratorConfig::default();
    OrchestratorConfig {
        api_hostname: overlay.api_hostname.or(base.api_hostname),
        federated_registry_token_expiry_secs: if overlay.federated_registry_token_expiry_secs
            != default.federated_registry_token_expiry_secs
        {
            overlay.federated_registry_token_expiry_secs
        } else {
            base.federated_registry_token_expiry_secs
        },
        max_query_page_size: if overlay.max_query_page_size != default.max_query_page_size {
            overlay.max_query_page_size
        } else {
            base.max_query_page_size
        },
        default_log_page_size_bytes: if overlay.default_log_page_size_bytes
            != default.default_log_page_size_bytes
        {
            overlay.default_log_page_size_bytes
        } else {
            base.default_log_page_size_bytes
        },
        max_log_page_size_bytes: if overlay.max_log_page_size_bytes
            != default.max_log_page_size_bytes
        {
            overlay.max_log_page_size_bytes
        } else {
            base.max_log_page_size_bytes
        },
        cancel_grace_period_secs: if overlay.cancel_grace_period_secs
            != default.cancel_grace_period_secs
        {
            overlay.cancel_grace_period_secs
        } else {
            base.cancel_grace_period_secs
        },
        mcp_read_only: overlay.mcp_read_only,
        mcp_enabled_toolsets: if overlay.mcp_enabled_toolsets.is_empty() {
            base.mcp_enabled_toolsets
        } else {
            overlay.mcp_enabled_toolsets
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = OrchestratorConfig::default();
        let warnings = validate_config(&cfg).expect("default config should be valid");
        assert!(!warnings.is_empty(), "should warn about missing api_hostname");
    }

    #[test]
    fn default_config_has_sensible_defaults() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.federated_registry_token_expiry_secs, 60);
        assert_eq!(cfg.max_query_page_size, 100);
        assert_eq!(cfg.default_log_page_size_bytes, 10 * 1024);
        assert_eq!(cfg.max_log_page_size_bytes, 50_000);
        assert_eq!(cfg.cancel_grace_period_secs, 30);
        assert!(cfg.mcp_read_only);
    }

    #[test]
    fn parse_valid_toml_string() {
        let toml = r#"
            api_hostname = "tharsis.example.com"
            federated_registry_token_expiry_secs = 90
            mcp_enabled_toolsets = ["runs", "plans"]
        "#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.api_hostname.as_deref(), Some("tharsis.example.com"));
        assert_eq!(cfg.federated_registry_token_expiry_secs, 90);
        assert_eq!(cfg.mcp_enabled_toolsets, vec!["runs", "plans"]);
    }

    #[test]
    fn parse_invalid_toml_gives_parse_error() {
        let bad = "this is [not valid toml =";
        let err = parse_toml(bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn parse_wrong_types_gives_parse_error() {
        let toml = r#"max_query_page_size = "a lot""#;
        let err = parse_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn validation_catches_zero_token_expiry() {
        let cfg = OrchestratorConfig {
            federated_registry_token_expiry_secs: 0,
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_zero_cancel_grace_period() {
        let cfg = OrchestratorConfig {
            cancel_grace_period_secs: 0,
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn validation_catches_default_page_size_exceeding_max() {
        let cfg = OrchestratorConfig {
            default_log_page_size_bytes: 100 * 1024,
            max_log_page_size_bytes: 50_000,
            ..Default::default()
        };
        let err = validate_config(&cfg).unwrap_err();
        match err {
            ConfigError::ValidationError { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("exceeds")));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn large_token_expiry_produces_warning() {
        let cfg = OrchestratorConfig {
            api_hostname: Some("h".into()),
            federated_registry_token_expiry_secs: 7200,
            ..Default::default()
        };
        let warnings = validate_config(&cfg).unwrap();
        assert!(warnings.iter().any(|w| matches!(w, ConfigWarning::LargeTokenExpiry { .. })));
    }

    #[test]
    fn merge_overlay_overrides_base() {
        let base = OrchestratorConfig {
            api_hostname: Some("old.example.com".into()),
            ..Default::default()
        };
        let overlay = OrchestratorConfig {
            api_hostname: Some("new.example.com".into()),
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.api_hostname.as_deref(), Some("new.example.com"));
    }

    #[test]
    fn merge_preserves_base_scalar_when_overlay_is_default() {
        let base = OrchestratorConfig {
            federated_registry_token_expiry_secs: 120,
            ..Default::default()
        };
        let merged = merge_configs(base.clone(), OrchestratorConfig::default());
        assert_eq!(merged.federated_registry_token_expiry_secs, 120);
    }

    #[test]
    fn merge_toolsets_overlay_replaces_when_nonempty() {
        let base = OrchestratorConfig {
            mcp_enabled_toolsets: vec!["runs".into()],
            ..Default::default()
        };
        let overlay = OrchestratorConfig {
            mcp_enabled_toolsets: vec!["plans".into(), "applies".into()],
            ..Default::default()
        };
        let merged = merge_configs(base, overlay);
        assert_eq!(merged.mcp_enabled_toolsets, vec!["plans", "applies"]);
    }

    #[test]
    fn merge_toolsets_base_kept_when_overlay_empty() {
        let base = OrchestratorConfig {
            mcp_enabled_toolsets: vec!["runs".into()],
            ..Default::default()
        };
        let merged = merge_configs(base, OrchestratorConfig::default());
        assert_eq!(merged.mcp_enabled_toolsets, vec!["runs"]);
    }

    #[test]
    fn empty_string_toml_parses_to_defaults() {
        let cfg = parse_toml("").unwrap();
        assert_eq!(cfg.api_hostname, None);
        assert_eq!(cfg.max_query_page_size, 100);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = OrchestratorConfig {
            api_hostname: Some("tharsis.example.com".into()),
            federated_registry_token_expiry_secs: 45,
            max_query_page_size: 200,
            default_log_page_size_bytes: 4096,
            max_log_page_size_bytes: 65536,
            mcp_read_only: false,
            mcp_enabled_toolsets: vec!["runs".into()],
        };
        let serialized = toml::to_string(&cfg).unwrap();
        let deserialized: OrchestratorConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, deserialized);
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tharsis.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "api_hostname = \"tharsis.example.com\"\nmax_query_page_size = 50").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.api_hostname.as_deref(), Some("tharsis.example.com"));
        assert_eq!(cfg.max_query_page_size, 50);
    }

    #[test]
    fn load_missing_file_gives_file_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/tharsis.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn load_none_returns_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.max_query_page_size, 100);
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::FileNotFound { path: "/foo".into() };
        assert!(e.to_string().contains("/foo"));

        let e = ConfigError::ParseError { reason: "bad toml".into() };
        assert!(e.to_string().contains("bad toml"));
    }

    #[test]
    fn config_warning_display() {
        let w = ConfigWarning::MissingOptionalField { field: "f".into(), hint: "h".into() };
        assert!(w.to_string().contains('f'));

        let w = ConfigWarning::LargeTokenExpiry { secs: 9999 };
        assert!(w.to_string().contains("9999"));
    }
}

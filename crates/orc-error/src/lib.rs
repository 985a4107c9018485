//! Unified error taxonomy with stable error codes for the orchestration core.
//!
//! Every core error carries an [`ErrorKind`] (the domain-level kinds named
//! in the execution core's error-handling design: `Invalid`, `NotFound`,
//! `Forbidden`, `Conflict`, `Unauthenticated`, `Network`, `Internal`), a
//! human-readable message, an optional cause chain, and arbitrary key-value
//! context. Use the builder returned by [`CoreError::new`] to construct
//! errors fluently; every other crate in this workspace returns
//! `Result<T, CoreError>` so that a peer-registry error's *kind* survives
//! being wrapped with context as it propagates (hostname, URL, rule id, …).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Domain-level error kind. Not a wire/HTTP status — callers at the RPC
/// boundary map these to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// User input malformed, or an illegal state transition was requested.
    Invalid,
    /// The requested entity does not exist.
    NotFound,
    /// Authorization or policy-rule evaluation failed.
    Forbidden,
    /// Optimistic-concurrency loss, or an illegal timing of a force-cancel.
    Conflict,
    /// A token is missing, malformed, or expired.
    Unauthenticated,
    /// A peer registry or service-discovery call failed.
    Network,
    /// An invariant was broken. Should never surface to end users verbatim.
    Internal,
}

impl ErrorKind {
    /// Stable `&'static str` representation (e.g. `"NOT_FOUND"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Network => "NETWORK",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified core error.
///
/// Carries a stable [`ErrorKind`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Examples
///
/// ```
/// use orc_error::{CoreError, ErrorKind};
///
/// let err = CoreError::new(ErrorKind::NotFound, "managed identity not found")
///     .with_context("managed_identity_id", "mi-123");
/// assert_eq!(err.kind, ErrorKind::NotFound);
/// ```
pub struct CoreError {
    /// Machine-readable error kind.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics (hostname, URL, rule id…).
    pub context: BTreeMap<String, serde_json::Value>,
}

impl CoreError {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Shorthand for `Self::new(ErrorKind::Invalid, ..)`.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    /// Shorthand for `Self::new(ErrorKind::NotFound, ..)`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for `Self::new(ErrorKind::Forbidden, ..)`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Shorthand for `Self::new(ErrorKind::Conflict, ..)`.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for `Self::new(ErrorKind::Unauthenticated, ..)`.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Shorthand for `Self::new(ErrorKind::Network, ..)`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Shorthand for `Self::new(ErrorKind::Internal, ..)`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause, preserving its kind via `self.kind`.
    ///
    /// Used when wrapping a peer-registry or HTTP error with local context
    /// (hostname, URL) while keeping the error's kind intact for downstream
    /// policy decisions.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// `true` if this error's kind is [`ErrorKind::Internal`].
    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }

    /// The fixed string an RPC boundary should scrub `Internal` messages to
    /// before returning them to an end user. Non-`Internal` errors are
    /// returned unmodified by callers — this core never performs the
    /// scrubbing itself since the RPC boundary is out of scope.
    pub const INTERNAL_SCRUB_MESSAGE: &'static str = "internal error";
}

impl fmt::Debug for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CoreError");
        d.field("kind", &self.kind);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if !self.context.is_empty() {
            // Deterministic output thanks to BTreeMap.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Serialisable snapshot of a [`CoreError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreErrorDto {
    /// Error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CoreError> for CoreErrorDto {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<CoreErrorDto> for CoreError {
    fn from(dto: CoreErrorDto) -> Self {
        Self {
            kind: dto.kind,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

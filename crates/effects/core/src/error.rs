//! Common error infrastructure for effects-core.
//!
//! This module provides the shared severity classification and trait used by
//! every error type in the crate. Domain-specific errors (`CurveError`,
//! `EvaluateError`, `RefError`, `ContainerError`) live next to the code that
//! produces them.
//!
//! Stale handles and expired weak links are not errors at all: lookups return
//! sentinels and evaluation skips dead entries. Only content mistakes, graph
//! cycles (in strict evaluation) and handle exhaustion surface as `Err`.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the caller can continue with a safe default
/// - **Validation**: a reference or argument was in the wrong state
/// - **Content**: authored data is broken (missing curve, cyclic wiring)
/// - **Fatal**: the engine cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the operation degraded to a default value.
    Recoverable,

    /// Validation error - precondition not met, do not retry unchanged.
    ///
    /// Examples: demoting a ref that is already soft
    Validation,

    /// Content error - authored data is inconsistent.
    ///
    /// Examples: curve table row missing, modifier graph contains a cycle
    Content,

    /// Fatal error - internal state can no longer be trusted.
    ///
    /// Examples: active effect handle counter exhausted
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Content => "content",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if the error points at bad data or a broken engine.
    pub const fn is_content_or_fatal(&self) -> bool {
        matches!(self, Self::Content | Self::Fatal)
    }
}

/// Common trait for all effects-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on what the caller can do about it
pub trait EffectsError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

//! Structured error handling for the voice service
//!
//! Every fallible operation inside the crate returns [`Result`]. The public
//! facade converts these into booleans and optional paths, so nothing in this
//! module ever reaches a caller of `VoiceService` directly.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for the voice service
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    /// Missing reference audio, unknown speaker id or missing feature file
    #[error("{what} not found: {target}")]
    NotFound { what: String, target: String },

    /// Engine not installed or required model files absent
    #[error("Engine '{engine}' unavailable: {reason}")]
    Unavailable { engine: String, reason: String },

    /// Model acquisition failed for a reason other than a missing installation
    #[error("Failed to load model for '{engine}': {message}")]
    LoadFailure { engine: String, message: String },

    /// Inference produced no audio
    #[error("Engine '{engine}' produced no audio in {mode} mode")]
    EmptyResult { engine: String, mode: String },

    /// Runtime failure while an engine was synthesizing
    #[error("Synthesis failed on '{engine}': {message}")]
    Transient { engine: String, message: String },

    /// Registry document unreadable or unwritable
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        path: Option<PathBuf>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Audio processing errors
    #[error("Audio processing error ({operation}): {message}")]
    Audio {
        message: String,
        operation: AudioOperation,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// I/O errors
    #[error("I/O error: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Internal/bug errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        location: Option<String>,
    },
}

impl TtsError {
    /// Shorthand for a missing speaker record
    pub fn unknown_speaker(speaker_id: &str) -> Self {
        TtsError::NotFound {
            what: "Speaker".to_string(),
            target: speaker_id.to_string(),
        }
    }

    /// Shorthand for a missing reference recording
    pub fn missing_audio(path: &std::path::Path) -> Self {
        TtsError::NotFound {
            what: "Reference audio".to_string(),
            target: path.display().to_string(),
        }
    }

    /// Whether retrying the same request on another engine could succeed.
    ///
    /// Validation failures describe the request itself, so a second engine
    /// would reject it too.
    pub fn is_fallback_eligible(&self) -> bool {
        !matches!(self, TtsError::Validation { .. })
    }

    /// Short stable label used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            TtsError::NotFound { .. } => "not_found",
            TtsError::Unavailable { .. } => "unavailable",
            TtsError::LoadFailure { .. } => "load_failure",
            TtsError::EmptyResult { .. } => "empty_result",
            TtsError::Transient { .. } => "transient",
            TtsError::Persistence { .. } => "persistence",
            TtsError::Config { .. } => "config",
            TtsError::Audio { .. } => "audio",
            TtsError::Validation { .. } => "validation",
            TtsError::Io { .. } => "io",
            TtsError::Internal { .. } => "internal",
        }
    }
}

/// Audio operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOperation {
    Concatenation,
    Saving,
}

impl fmt::Display for AudioOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOperation::Concatenation => write!(f, "concatenation"),
            AudioOperation::Saving => write!(f, "saving"),
        }
    }
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        TtsError::Persistence {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_yaml::Error> for TtsError {
    fn from(err: serde_yaml::Error) -> Self {
        TtsError::Config {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<hound::Error> for TtsError {
    fn from(err: hound::Error) -> Self {
        TtsError::Audio {
            message: err.to_string(),
            operation: AudioOperation::Saving,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TtsError::Unavailable {
            engine: "cached_identity".to_string(),
            reason: "missing llm.pt".to_string(),
        };
        assert!(err.to_string().contains("cached_identity"));
        assert!(err.to_string().contains("missing llm.pt"));
    }

    #[test]
    fn test_unknown_speaker_message() {
        let err = TtsError::unknown_speaker("bob");
        assert_eq!(err.to_string(), "Speaker not found: bob");
        assert_eq!(err.category(), "not_found");
    }

    #[test]
    fn test_fallback_eligibility() {
        let empty = TtsError::EmptyResult {
            engine: "cached_identity".to_string(),
            mode: "zero_shot".to_string(),
        };
        assert!(empty.is_fallback_eligible());

        let invalid = TtsError::Validation {
            message: "text is empty".to_string(),
            field: Some("text".to_string()),
        };
        assert!(!invalid.is_fallback_eligible());
    }

    #[test]
    fn test_audio_operation_display() {
        assert_eq!(AudioOperation::Concatenation.to_string(), "concatenation");
    }
}

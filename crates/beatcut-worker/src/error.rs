//! Render job error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use beatcut_media::MediaError;
use beatcut_models::TimelineError;

pub type RenderResult<T> = Result<T, RenderError>;

/// Caller-facing classification of a failed render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderErrorKind {
    ConfigError,
    ToolUnavailable,
    ExternalToolFailure,
    Io,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Beat timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Required tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("{step} failed: {source}")]
    ExternalTool {
        step: &'static str,
        #[source]
        source: MediaError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attribute a media failure to a pipeline step.
    pub fn tool(step: &'static str, source: MediaError) -> Self {
        if source.is_tool_missing() {
            Self::ToolUnavailable(source.to_string())
        } else {
            Self::ExternalTool { step, source }
        }
    }

    pub fn kind(&self) -> RenderErrorKind {
        match self {
            RenderError::Config(_) | RenderError::Timeline(_) => RenderErrorKind::ConfigError,
            RenderError::ToolUnavailable(_) => RenderErrorKind::ToolUnavailable,
            RenderError::ExternalTool { .. } => RenderErrorKind::ExternalToolFailure,
            RenderError::Io(_) => RenderErrorKind::Io,
        }
    }

    /// Captured tool output for external failures.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            RenderError::ExternalTool { source, .. } => source.diagnostics(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_maps_to_unavailable() {
        let err = RenderError::tool("normalize", MediaError::FfmpegNotFound);
        assert_eq!(err.kind(), RenderErrorKind::ToolUnavailable);
    }

    #[test]
    fn test_tool_failure_keeps_diagnostics() {
        let err = RenderError::tool(
            "extract",
            MediaError::ffmpeg_failed("exit 1", Some("Invalid data found".into()), Some(1)),
        );
        assert_eq!(err.kind(), RenderErrorKind::ExternalToolFailure);
        assert_eq!(err.diagnostics(), Some("Invalid data found"));
        assert!(err.to_string().starts_with("extract failed"));
    }

    #[test]
    fn test_timeline_errors_are_config_errors() {
        let err = RenderError::from(TimelineError::Empty);
        assert_eq!(err.kind(), RenderErrorKind::ConfigError);
    }
}

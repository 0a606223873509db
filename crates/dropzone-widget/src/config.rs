//! Widget configuration: where success responses render and how failures
//! surface.

use std::str::FromStr;

use dropzone_ui::DomIds;
use serde::Deserialize;
use thiserror::Error;

/// Where a successful response body is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderTarget {
    /// Replace the whole document.
    #[default]
    Document,
    /// Inject into the main content region.
    Content,
}

/// How post-dispatch failures are surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureHandling {
    /// Show server errors inline, reload on zero-status failures.
    #[default]
    Report,
    /// Log failures without touching the page beyond `is-error`.
    LogOnly,
}

/// Complete widget configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Success rendering target.
    pub render_target: RenderTarget,
    /// Failure surfacing policy.
    pub failure_handling: FailureHandling,
    /// Page element ids.
    pub ids: DomIds,
}

/// Unrecognized configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value '{0}'")]
pub struct UnknownValue(pub String);

impl FromStr for RenderTarget {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(RenderTarget::Document),
            "content" => Ok(RenderTarget::Content),
            _ => Err(UnknownValue(raw.to_string())),
        }
    }
}

impl FromStr for FailureHandling {
    type Err = UnknownValue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(FailureHandling::Report),
            "log-only" | "log_only" | "log" => Ok(FailureHandling::LogOnly),
            _ => Err(UnknownValue(raw.to_string())),
        }
    }
}

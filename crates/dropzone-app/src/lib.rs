#![warn(missing_docs)]
//! # dropzone-app
//!
//! ## Purpose
//! Native host for the upload widget: wires configuration, logging, local
//! files, and the HTTP transport into one upload run.
//!
//! ## Responsibilities
//! - Load [`WidgetConfig`] from an optional JSON file and environment
//!   overrides.
//! - Initialize `tracing` output with CLI verbosity.
//! - Turn command-line fields and paths into a form snapshot and file entries.
//! - Drive the widget until its request completes, treating an interrupt as
//!   the cancel key.
//! - Summarize the final page state for terminal output.
//!
//! ## Data flow
//! CLI args -> [`load_config`] + [`build_form`] + [`load_files`] -> widget
//! submit -> [`await_completion`] -> [`summarize`].
//!
//! ## Ownership and lifetimes
//! The binary owns the widget and the completion receiver; this crate only
//! borrows them for the duration of one run.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Upload failures after
//! dispatch are not errors; they are reported through the widget.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use dropzone_core::{DEFAULT_FILE_CONTENT_TYPE, FileEntry, FormSnapshot};
use dropzone_ui::{Element, HeadlessDocument};
use dropzone_upload::{Completion, UploadError};
use dropzone_widget::{
    CANCEL_KEY, CompletionReport, FailureHandling, RenderTarget, UploadWidget, WidgetConfig,
    WidgetError,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("DROPZONE_VERSION");

/// Environment variable overriding the success render target.
pub const RENDER_TARGET_ENV: &str = "DROPZONE_RENDER_TARGET";

/// Environment variable overriding failure handling.
pub const FAILURE_HANDLING_ENV: &str = "DROPZONE_FAILURE_HANDLING";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise each `-v` raises the level from
/// `warn`. Repeated calls are ignored.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Loads widget configuration, then applies environment overrides.
///
/// # Errors
/// Returns [`AppError::ConfigRead`] or [`AppError::ConfigParse`] when `path`
/// is given and cannot be read as a configuration document.
pub fn load_config(path: Option<&Path>) -> Result<WidgetConfig, AppError> {
    let config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
            let config: WidgetConfig = serde_json::from_str(&raw)?;
            debug!(path = %path.display(), "loaded widget config");
            config
        }
        None => WidgetConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

/// Applies [`RENDER_TARGET_ENV`] and [`FAILURE_HANDLING_ENV`] to `config`.
pub fn apply_env_overrides(mut config: WidgetConfig) -> WidgetConfig {
    if let Some(render_target) = render_target_from_env() {
        config.render_target = render_target;
    }
    if let Some(failure_handling) = failure_handling_from_env() {
        config.failure_handling = failure_handling;
    }
    config
}

/// Reads the render target override.
///
/// Semantics:
/// - Unset => no override.
/// - `document` or `content` (case-insensitive) => that target.
/// - Any other value => logged and ignored.
pub fn render_target_from_env() -> Option<RenderTarget> {
    parse_env(RENDER_TARGET_ENV)
}

/// Reads the failure handling override.
///
/// Accepts `report` or `log-only`; anything else is logged and ignored.
pub fn failure_handling_from_env() -> Option<FailureHandling> {
    parse_env(FAILURE_HANDLING_ENV)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring unknown config override");
            None
        }
    }
}

/// Parses a `name=value` form field argument.
///
/// # Errors
/// Returns [`AppError::Field`] when `=` is missing or the name is blank.
pub fn parse_field(raw: &str) -> Result<(String, String), AppError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(AppError::Field(raw.to_string())),
    }
}

/// Builds the form snapshot the widget submits.
pub fn build_form(
    action: &str,
    method: Option<&str>,
    fields: Vec<(String, String)>,
    file_field: &str,
) -> FormSnapshot {
    let mut form = FormSnapshot::new(action, file_field);
    if let Some(method) = method {
        form = form.with_method(method);
    }
    fields
        .into_iter()
        .fold(form, |form, (name, value)| form.with_field(name, value))
}

/// Reads local files into upload entries, in argument order.
///
/// # Errors
/// Returns [`AppError::FileRead`] for the first unreadable path.
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<FileEntry>, AppError> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).map_err(|source| AppError::FileRead {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FileEntry::new(name, content_type_for(path), bytes))
        })
        .collect()
}

/// Guesses a file's content type from its extension.
///
/// Unknown or missing extensions fall back to [`DEFAULT_FILE_CONTENT_TYPE`].
pub fn content_type_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_FILE_CONTENT_TYPE)
}

/// Feeds completions into the widget until its request finishes.
///
/// When `interrupt` resolves first, the widget receives [`CANCEL_KEY`] once and
/// the loop keeps waiting for the resulting abort completion.
///
/// # Errors
/// Returns [`AppError::CompletionChannelClosed`] when every sender is dropped
/// before the request finishes.
pub async fn await_completion<D, F>(
    widget: &mut UploadWidget<D>,
    completions: &mut UnboundedReceiver<Completion>,
    interrupt: F,
) -> Result<CompletionReport, AppError>
where
    D: dropzone_ui::Document,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        tokio::select! {
            completion = completions.recv() => {
                let Some(completion) = completion else {
                    return Err(AppError::CompletionChannelClosed);
                };
                if let Some(report) = widget.on_complete(completion) {
                    return Ok(report);
                }
            }
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                info!("interrupt received, cancelling upload");
                widget.on_key_up(CANCEL_KEY);
            }
        }
    }
}

/// Renders the final page state as terminal text.
pub fn summarize(widget: &UploadWidget<HeadlessDocument>, report: &CompletionReport) -> String {
    let document = widget.document();
    let classes = widget
        .snapshot()
        .form_classes
        .iter()
        .map(|class| class.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = format!(
        "request: {} {:?} ({:?})\nform: {}\n",
        report.id,
        report.status,
        report.exit,
        if classes.is_empty() { "-" } else { classes.as_str() }
    );

    if let Some(message) = document
        .html_of(Element::ErrorMessage)
        .filter(|html| !html.is_empty())
    {
        out.push_str(&format!("error: {message}\n"));
    }
    if document.reload_count() > 0 {
        out.push_str("page: reloaded\n");
    }

    let rendered = match widget.config().render_target {
        RenderTarget::Document => document.written_document(),
        RenderTarget::Content => document.html_of(Element::MainContent),
    };
    if let Some(rendered) = rendered {
        out.push_str("---\n");
        out.push_str(rendered);
        if !rendered.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Configuration file is not valid JSON for [`WidgetConfig`].
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// Field argument is not `name=value`.
    #[error("invalid field '{0}', expected name=value")]
    Field(String),
    /// Upload file could not be read.
    #[error("cannot read {path}: {source}")]
    FileRead {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Page URL did not parse.
    #[error("invalid page url: {0}")]
    Page(#[from] url::ParseError),
    /// Async runtime could not start.
    #[error("runtime error: {0}")]
    Runtime(std::io::Error),
    /// Transport setup failed.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// Submission could not start.
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),
    /// Widget declined to submit.
    #[error("upload not started: {0}")]
    NotDispatched(String),
    /// Transport dropped its completion sender.
    #[error("completion channel closed before the upload finished")]
    CompletionChannelClosed,
}

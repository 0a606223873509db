use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dropzone_app::{
    AppError, await_completion, build_form, init_logging, load_config, load_files, parse_field,
    summarize,
};
use dropzone_ui::HeadlessDocument;
use dropzone_upload::HttpTransport;
use dropzone_widget::{ExitState, FailureHandling, RenderTarget, SubmitOutcome, UploadWidget};
use tokio::sync::mpsc;
use tracing::{error, info};
use url::Url;

/// Uploads files through the dropzone widget against a live endpoint.
#[derive(Debug, Parser)]
#[command(name = "dropzone", version = dropzone_app::APP_VERSION)]
struct Args {
    /// Files to upload, in order
    #[arg()]
    files: Vec<PathBuf>,

    /// URL of the page hosting the form; relative actions resolve against it
    #[arg(long, default_value = "http://localhost:8080/")]
    page: String,

    /// Form action; empty submits to the page URL
    #[arg(long, default_value = "")]
    action: String,

    /// Form method (post, put, patch); defaults to post
    #[arg(long)]
    method: Option<String>,

    /// Extra form field as name=value, may be repeated
    #[arg(long = "field", value_name = "NAME=VALUE")]
    fields: Vec<String>,

    /// Name of the file input the files are attached under
    #[arg(long, default_value = "file")]
    file_field: String,

    /// Attach files as a drag-and-drop instead of the file picker
    #[arg(long)]
    drop: bool,

    /// Where a successful response is rendered (document, content)
    #[arg(long)]
    render: Option<RenderTarget>,

    /// How failures are surfaced (report, log-only)
    #[arg(long)]
    failure_handling: Option<FailureHandling>,

    /// JSON widget configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// How verbose the output should be, can be set up to 3 times. Has no effect if RUST_LOG is set
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            error!(%error, "upload run failed");
            eprintln!("dropzone: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::Runtime)?;
    runtime.block_on(upload(args))
}

async fn upload(args: Args) -> Result<ExitCode, AppError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(render) = args.render {
        config.render_target = render;
    }
    if let Some(failure_handling) = args.failure_handling {
        config.failure_handling = failure_handling;
    }

    let page = Url::parse(&args.page)?;
    let fields = args
        .fields
        .iter()
        .map(|raw| parse_field(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let form = build_form(&args.action, args.method.as_deref(), fields, &args.file_field);
    let files = load_files(&args.files)?;
    info!(files = files.len(), drop = args.drop, "starting upload");

    let (completions_tx, mut completions) = mpsc::unbounded_channel();
    let transport = HttpTransport::new(completions_tx)?;
    let mut widget = UploadWidget::new(config, HeadlessDocument::new(page), Box::new(transport));

    let outcome = if args.drop {
        widget.on_drop(form, files)?
    } else {
        widget.on_file_selected(form.with_selected_files(files))?
    };
    if !matches!(outcome, SubmitOutcome::Dispatched(_)) {
        return Err(AppError::NotDispatched(format!("{outcome:?}")));
    }

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let report = await_completion(&mut widget, &mut completions, interrupt).await?;
    print!("{}", summarize(&widget, &report));

    Ok(match report.exit {
        ExitState::Success => ExitCode::SUCCESS,
        ExitState::Error => ExitCode::FAILURE,
        ExitState::Aborted => ExitCode::from(130),
    })
}

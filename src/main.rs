use std::{process, sync::Arc};

use tokio::sync::watch;
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

use toastdeck::{
    application::error::AppError,
    application::toasts::ToastService,
    client::{
        api::HttpToastApi,
        display::{DisplaySession, DisplayView, SummaryRow},
    },
    config,
    infra::{
        http::{self, AppState},
        store::FileToastStore,
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()))
    {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Watch(args) => run_watch(args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = Arc::new(FileToastStore::new(settings.storage.data_file.clone())?);
    let state = AppState {
        toasts: Arc::new(ToastService::new(store)),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(AppError::Server)?;
    info!(
        target = "toastdeck::serve",
        addr = %settings.server.addr,
        data_file = %settings.storage.data_file.display(),
        "Listening"
    );
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

async fn run_watch(args: config::WatchArgs) -> Result<(), AppError> {
    let api = HttpToastApi::new(&args.site)?;
    let mut session = DisplaySession::new(api, LogDisplayView);

    // The sender is held for the lifetime of the watch; the session runs
    // until the process is terminated.
    let (_visibility, receiver) = watch::channel(true);
    info!(target = "toastdeck::watch", site = %args.site, "Watching for toast changes");
    session.run(receiver).await;
    Ok(())
}

/// Terminal-bound display surface: logs instead of painting.
struct LogDisplayView;

impl DisplayView for LogDisplayView {
    fn set_count(&mut self, count: usize) {
        info!(target = "toastdeck::watch", count, "Toast collection changed");
    }

    fn set_triggers(&mut self, labels: Vec<String>) {
        for label in labels {
            debug!(target = "toastdeck::watch", "{label}");
        }
    }

    fn render_summary(&mut self, rows: Vec<SummaryRow>) {
        for row in rows {
            info!(
                target = "toastdeck::watch",
                number = row.number,
                title = %row.title,
                kind = row.kind,
                position = row.position,
                duration_ms = row.duration,
                "toast"
            );
        }
    }

    fn set_refresh_status(&mut self, status: &str) {
        debug!(target = "toastdeck::watch", status, "refresh status");
    }

    fn set_last_update(&mut self, clock: String) {
        debug!(target = "toastdeck::watch", clock = %clock, "updated");
    }

    fn warn_empty(&mut self) {
        warn!(
            target = "toastdeck::watch",
            "No toasts to show. Please create some on the Editor page."
        );
    }
}

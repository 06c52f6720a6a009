use std::{process, sync::Arc};

use apalis::{
    layers::WorkerBuilderExt,
    prelude::{Monitor, WorkerBuilder, WorkerFactoryFn},
};
use apalis_sql::{Config as ApalisSqlConfig, postgres::PostgresStorage};
use raccolta::{
    application::{
        error::AppError,
        jobs::{JobWorkerContext, process_apply_draft_job},
        merge::MergeService,
        repos::{AdvertsWriteRepo, EventsRepo},
    },
    config,
    domain::types::JobType,
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let (service_repositories, job_repositories) = init_repositories(&settings).await?;
    let app = build_application_context(service_repositories);

    let monitor_handle = spawn_job_monitor(job_repositories, app.job_context, &settings.jobs);

    info!(target = "raccolta", "advert services started");

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target = "raccolta", "shutdown signal received");

    monitor_handle.abort();
    let _ = monitor_handle.await;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "raccolta", "migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<(Arc<PostgresRepositories>, Arc<PostgresRepositories>), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let service_pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&service_pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let jobs_pool =
        PostgresRepositories::connect(database_url, settings.database.jobs_max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok((
        Arc::new(PostgresRepositories::new(service_pool)),
        Arc::new(PostgresRepositories::new(jobs_pool)),
    ))
}

struct ApplicationContext {
    job_context: JobWorkerContext,
}

fn build_application_context(repositories: Arc<PostgresRepositories>) -> ApplicationContext {
    let adverts_write_repo: Arc<dyn AdvertsWriteRepo> = repositories.clone();
    let events_repo: Arc<dyn EventsRepo> = repositories;

    let merge = Arc::new(MergeService::new(adverts_write_repo, events_repo));

    ApplicationContext {
        job_context: JobWorkerContext { merge },
    }
}

fn spawn_job_monitor(
    repositories: Arc<PostgresRepositories>,
    context: JobWorkerContext,
    jobs: &config::JobsSettings,
) -> tokio::task::JoinHandle<()> {
    let apply_draft_storage = PostgresStorage::new_with_config(
        repositories.pool().clone(),
        ApalisSqlConfig::new(JobType::ApplyDraft.as_str()),
    );

    let apply_draft_concurrency = jobs.apply_draft_concurrency.get() as usize;

    let apply_draft_worker = WorkerBuilder::new("apply-draft-worker")
        .concurrency(apply_draft_concurrency)
        .data(context)
        .backend(apply_draft_storage)
        .build_fn(process_apply_draft_job);

    let monitor = Monitor::new().register(apply_draft_worker);

    tokio::spawn(async move {
        if let Err(err) = monitor.run().await {
            error!(error = %err, "job monitor stopped");
        }
    })
}

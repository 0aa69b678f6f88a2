use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use student_records::{
    api, config, logging,
    repository::{InMemoryStudentRepository, PostgresStudentRepository, StudentRepository},
    service::StudentService,
    summary,
};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "student-records",
    about = "REST service for student records with optional LLM summaries"
)]
struct Cli {
    /// Port to listen on, overriding `PORT`.
    #[arg(long)]
    port: Option<u16>,
    /// Use the volatile in-memory store even when `DATABASE_URL` is set.
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::load_env_file();
    logging::init_tracing();
    let config = config::init_config().context("Failed to load config from environment")?;

    let repository = build_repository(config, cli.in_memory).await?;
    let summarizer = summary::get_summary_client().context("Failed to build summary client")?;
    let service = StudentService::new(repository, Arc::new(summarizer));
    tracing::info!(backend = service.backend_name(), "Storage backend selected");
    let app = api::create_router(Arc::new(service));

    let port = cli.port.unwrap_or(config.server_port);
    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn build_repository(
    config: &config::Config,
    force_in_memory: bool,
) -> anyhow::Result<Arc<dyn StudentRepository>> {
    match config.postgres_url(force_in_memory) {
        Some(url) => {
            let repository =
                PostgresStudentRepository::connect(url, config.database_max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
            Ok(Arc::new(repository))
        }
        None => {
            tracing::warn!(
                database_configured = config.database_url.is_some(),
                "Using in-memory store; records will not survive a restart"
            );
            Ok(Arc::new(InMemoryStudentRepository::new()))
        }
    }
}

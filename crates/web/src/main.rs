use std::sync::Arc;

use anyhow::Context;
use storage::{
    Database,
    repository::{PgProfileRepository, PgResultRepository},
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod state;

use config::Config;
use features::{leaderboard, recalculation};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        leaderboard::handlers::get_leaderboard,
        leaderboard::handlers::get_participant_results,
        leaderboard::handlers::list_races,
        leaderboard::handlers::export_leaderboard,
        recalculation::handlers::recalculate_points,
    ),
    components(
        schemas(
            storage::dto::leaderboard::Leaderboard,
            storage::dto::leaderboard::IndividualEntry,
            storage::dto::leaderboard::TeamEntry,
            storage::dto::leaderboard::SortOrder,
            storage::dto::recalculation::RecalculateRequest,
            storage::dto::recalculation::RecalculationReport,
            storage::dto::recalculation::RaceRecalculation,
            storage::models::Race,
            storage::models::ResultKind,
            storage::models::ResultSelection,
        )
    ),
    tags(
        (name = "leaderboard", description = "Public leaderboard endpoints"),
        (name = "admin", description = "Points maintenance endpoints"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting leaderboard API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!(
        "Configuration loaded: {:?} points {}/{}/{}, {} lock attempt(s)",
        config.formula,
        config.points.winner,
        config.points.step,
        config.points.floor,
        config.recalculation.max_attempts
    );

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let state = AppState::new(
        Arc::new(PgResultRepository::new(db.pool().clone())),
        Arc::new(PgProfileRepository::new(db.pool().clone())),
        config.formula.build(config.points),
        config.recalculation.clone(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    let app = features::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}

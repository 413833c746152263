//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        content_llm::OpenAiContentAdapter, db::DbAdapter, plan_llm::OpenAiPlanAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        approve_passage_handler, approve_question_batch_handler, fetch_passages_handler,
        fetch_questions_handler, generate_passage_handler, generate_question_drafts_handler,
        generate_study_plan_handler, middleware::require_auth, rest::ApiDoc,
        save_practice_attempt_handler, state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sat_content_core::{content::ContentPipeline, study::StudyPlanner};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let content_adapter = Arc::new(OpenAiContentAdapter::new(
        openai_client.clone(),
        config.content_model.clone(),
    ));
    let plan_adapter = Arc::new(OpenAiPlanAdapter::new(
        openai_client.clone(),
        config.plan_model.clone(),
    ));

    // --- 4. Wire the Workflows & Build the Shared AppState ---
    // The same database adapter backs both the document store and the
    // role-resolution gate.
    let pipeline = Arc::new(ContentPipeline::new(
        db_adapter.clone(),
        content_adapter,
        db_adapter.clone(),
    ));
    let planner = Arc::new(StudyPlanner::new(db_adapter.clone(), plan_adapter));

    let app_state = Arc::new(AppState {
        store: db_adapter,
        pipeline,
        planner,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Every route requires an authenticated session; admin-only operations
    // are additionally gated inside the workflows.
    let api_router = Router::new()
        .route("/passages/generate", post(generate_passage_handler))
        .route("/passages/approve", post(approve_passage_handler))
        .route("/passages/fetch", get(fetch_passages_handler))
        .route("/questions/generate", post(generate_question_drafts_handler))
        .route("/questions/approve", post(approve_question_batch_handler))
        .route("/questions/fetch", get(fetch_questions_handler))
        .route("/practice-history/save", post(save_practice_attempt_handler))
        .route("/recommendations/generate", post(generate_study_plan_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpPageFetcher, LibreTranslateAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{add_user_handler, create_session_handler},
        middleware::require_session,
        rest::{
            available_languages, contribute_with_context, contributions, contributions_by_day,
            get_page, learned_and_native_language, learned_language, learned_language_set, lookup,
            lookup_preferred, native_language, native_language_set, studied_words,
            translate_from_to, translate_legacy, translate_with_context, validate,
        },
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
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
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Provider Adapters ---
    let http_client = reqwest::Client::new();
    let translator = Arc::new(LibreTranslateAdapter::new(
        http_client.clone(),
        config.translate_api_url.clone(),
        config.translate_api_key.clone(),
    ));
    let pages = Arc::new(HttpPageFetcher::new(
        http_client,
        config.page_fetch_user_agent.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        identity: db_adapter.clone(),
        vocabulary: db_adapter.clone(),
        contributions: db_adapter,
        translator,
        pages,
        config: config.clone(),
    });

    // The API is consumed by browser extensions on arbitrary pages, so
    // any origin is allowed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // --- 5. Create the Web Router ---
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/adduser/{email}", post(add_user_handler))
        .route("/session/{email}", post(create_session_handler))
        .route("/goslate/{word}/{from}", get(translate_legacy))
        .route("/translate_from_to/{word}/{from}/{to}", get(translate_from_to))
        .route(
            "/translate_with_context/{word}/{from}/{to}",
            post(translate_with_context),
        );

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/learned_language", get(learned_language))
        .route("/learned_language/{code}", post(learned_language_set))
        .route("/native_language", get(native_language))
        .route("/native_language/{code}", post(native_language_set))
        .route("/learned_and_native_language", get(learned_and_native_language))
        .route("/available_languages", get(available_languages))
        .route("/contribs", get(contributions))
        .route("/user_words", get(studied_words))
        .route("/contribs_by_day/{return_context}", get(contributions_by_day))
        .route(
            "/contribute_with_context/{from}/{term}/{to}/{translation}",
            post(contribute_with_context),
        )
        .route("/lookup/{from}/{term}/{to}", post(lookup))
        .route("/lookup/{from}/{term}", post(lookup_preferred))
        .route("/validate", get(validate))
        .route("/get_page/{*url}", get(get_page))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
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

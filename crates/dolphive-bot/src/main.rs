use std::sync::Arc;

use axum::{extract::State, middleware, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;

use adapters::{ApiCallCounter, GitHubContentStore, InMemoryContentStore};
use application::{
    IndexConfig, IndexService, MemoryService, ReminderScheduler, ReminderService, SchedulerConfig,
    ScopeLocks,
};
use auth::ApiKey;
use config::{AppConfig, StorageBackend};
use dolphive::{ContentStore, ReminderNotifier, ScopeId};
use dolphive_integration_discord::{DiscordClient, DiscordConfig, DiscordNotifier};
use models::HealthResponse;

/// Type aliases for application services over the selected content store
pub type AppIndexService = IndexService<dyn ContentStore>;
pub type AppMemoryService = MemoryService<dyn ContentStore>;
pub type AppReminderService = ReminderService<dyn ContentStore>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub memories: Arc<AppMemoryService>,
    pub reminders: Arc<AppReminderService>,
    pub api_calls: Arc<ApiCallCounter>,
    pub backend: StorageBackend,
}

impl AppState {
    /// Wire the services over one store, sharing a single lock registry
    pub fn from_store(
        store: Arc<dyn ContentStore>,
        api_calls: Arc<ApiCallCounter>,
        backend: StorageBackend,
        index_config: IndexConfig,
    ) -> Self {
        let locks = ScopeLocks::new();
        let index = Arc::new(AppIndexService::new(store.clone(), locks.clone(), index_config));

        Self {
            memories: Arc::new(AppMemoryService::new(store.clone(), index)),
            reminders: Arc::new(AppReminderService::new(store, locks)),
            api_calls,
            backend,
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Dolphive is running - memories surface from the repository".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: match state.backend {
            StorageBackend::GitHub => "github".to_string(),
            StorageBackend::Memory => "memory".to_string(),
        },
        api_calls: state.api_calls.count(),
    })
}

/// Assemble the HTTP surface
pub fn build_router(state: AppState, api_key: ApiKey) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::memory::router())
        .merge(routes::reminder::router())
        .layer(middleware::from_fn_with_state(api_key, auth::auth_middleware));

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn build_store(
    config: &AppConfig,
    api_calls: Arc<ApiCallCounter>,
) -> anyhow::Result<Arc<dyn ContentStore>> {
    match (config.backend, &config.github) {
        (StorageBackend::GitHub, Some(github)) => {
            let store = GitHubContentStore::new(github.clone(), api_calls)?;
            if store.ensure_repository().await? {
                tracing::info!("📦 Repository {}/{} created from template", github.owner, github.repo);
            }
            tracing::info!("📦 GitHub store: {}/{}", github.owner, github.repo);
            Ok(Arc::new(store))
        }
        (StorageBackend::GitHub, None) => anyhow::bail!("GitHub backend selected without settings"),
        (StorageBackend::Memory, _) => {
            tracing::warn!("⚠️  In-memory store - nothing is persisted");
            Ok(Arc::new(InMemoryContentStore::new()))
        }
    }
}

/// Load reminder queues and start delivery when Discord is configured
async fn start_reminders(config: &AppConfig, state: &AppState) -> anyhow::Result<()> {
    let Some(token) = config.discord_token.clone() else {
        tracing::warn!("⚠️  No DISCORD_TOKEN set - reminder delivery disabled");
        state.reminders.load_all(&[]).await?;
        return Ok(());
    };

    let client = Arc::new(DiscordClient::new(DiscordConfig::builder().token(token).build()?));

    let guild_scopes: Vec<ScopeId> = match client.guild_ids().await {
        Ok(ids) => ids
            .iter()
            .filter_map(|id| ScopeId::guild(id).ok())
            .collect(),
        Err(e) => {
            tracing::warn!("⚠️  Failed to list guilds: {}", e);
            Vec::new()
        }
    };
    state.reminders.load_all(&guild_scopes).await?;

    let notifier: Arc<dyn ReminderNotifier> = Arc::new(DiscordNotifier::new(client));
    ReminderScheduler::new(
        Arc::clone(&state.reminders),
        notifier,
        Some(SchedulerConfig {
            interval: config.reminder_interval,
            enabled: true,
        }),
    )
    .start();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("🐬 Dolphive initializing...");
    for warning in config.validate() {
        tracing::warn!("⚠️  {}", warning);
    }

    let api_key = ApiKey::new(config.api_key.clone());
    if api_key.is_enabled() {
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No DOLPHIVE_API_KEY set - authentication disabled");
    }

    let api_calls = Arc::new(ApiCallCounter::default());
    let store = build_store(&config, api_calls.clone()).await?;

    let state = AppState::from_store(
        store,
        api_calls,
        config.backend,
        IndexConfig {
            cache_ttl: config.index_cache_ttl,
        },
    );

    start_reminders(&config, &state).await?;

    let router = build_router(state.clone(), api_key);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Dolphive ready on {}", config.bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Waiting for background index updates...");
    state.memories.settle().await;
    tracing::info!("👋 Dolphive stopped");

    Ok(())
}

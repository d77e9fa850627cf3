use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityProvider, InMemoryIdentityProvider};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{CardStore, InMemoryCardStore};
use crate::database::models::Card;
use crate::handlers::{cashcards, public};
use crate::middleware::basic_auth_middleware;
use crate::paging::{PageDefaults, PagingError};
use crate::services::CardService;

/// Shared state handed to every handler and to the auth middleware
#[derive(Clone)]
pub struct AppState {
    pub cards: CardService,
    pub identities: Arc<dyn IdentityProvider>,
    pub security: Arc<SecurityConfig>,
    pub max_request_size_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn CardStore>,
        identities: Arc<dyn IdentityProvider>,
    ) -> Result<Self, PagingError> {
        let defaults = PageDefaults::from_config(&config.pagination)?;
        Ok(Self {
            cards: CardService::new(store, defaults),
            identities,
            security: Arc::new(config.security.clone()),
            max_request_size_bytes: config.api.max_request_size_bytes,
        })
    }

    /// In-memory store plus the configured users; used by local runs and tests
    pub fn in_memory(config: &AppConfig, cards: Vec<Card>) -> Result<Self, PagingError> {
        let store: Arc<dyn CardStore> = Arc::new(InMemoryCardStore::with_cards(cards));
        let identities: Arc<dyn IdentityProvider> =
            Arc::new(InMemoryIdentityProvider::new(&config.security.users));
        Self::new(config, store, identities)
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Basic auth required
        .merge(card_routes())
        // Covers unmatched /cashcards/** paths as well
        .layer(middleware::from_fn_with_state(state.clone(), basic_auth_middleware))
        // Global middleware
        .layer(DefaultBodyLimit::max(state.max_request_size_bytes))
        .layer(cors_layer(&state.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/cashcards", get(cashcards::list).post(cashcards::create))
        .route(
            "/cashcards/:id",
            get(cashcards::get).put(cashcards::put).delete(cashcards::delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::header::LOCATION])
}

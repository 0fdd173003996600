//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are the
//! crates' own `AuthError` / `BlogError` responses.

mod config;
mod health;

use auth::{AuthAppState, MongoAuthRepository, auth_router, users_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use blog::{BlogAppState, MongoBlogRepository, ai_router, blog_router};
use mongodb::Client;
use platform::genai::{GeminiClient, ScriptedGenerator, TextGenerator};
use platform::image::{HttpImageHost, ImageHost, MemoryImageStore};
use platform::mail::{BrevoClient, Mailer, Outbox};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::health::health_router;

const SCRIPTED_DRAFT: &str = "# Draft\n\nAI generation is not configured on this server.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,blog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let db = client.database(&config.mongodb_database);
    tracing::info!(database = %config.mongodb_database, "Connected to MongoDB");

    let auth_repo = MongoAuthRepository::new(db.clone());
    auth_repo.ensure_indexes().await?;
    let blog_repo = MongoBlogRepository::new(db.clone());
    blog_repo.ensure_indexes().await?;
    tracing::info!("Indexes ensured");

    // Outbound providers fall back to in-process stand-ins when unconfigured
    let http_client = reqwest::Client::new();

    let mailer = match config.brevo.clone() {
        Some(brevo) => Mailer::Brevo(BrevoClient::new(http_client.clone(), brevo)),
        None => {
            tracing::warn!("BREVO_API_KEY not set, mail goes to the in-process outbox");
            Mailer::Outbox(Outbox::new())
        }
    };

    let images = match config.image_host.clone() {
        Some(host) => ImageHost::Http(HttpImageHost::new(http_client.clone(), host)),
        None => {
            tracing::warn!("IMAGE_HOST_API_KEY not set, avatars are kept in memory");
            ImageHost::Memory(MemoryImageStore::default())
        }
    };

    let generator = match config.gemini.clone() {
        Some(gemini) => TextGenerator::Gemini(GeminiClient::new(http_client, gemini)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set, AI endpoints return a placeholder draft");
            TextGenerator::Scripted(ScriptedGenerator::new(SCRIPTED_DRAFT))
        }
    };

    let auth_state = AuthAppState::new(auth_repo, config.auth.clone(), mailer, images);
    let guard = auth_state.access_guard();
    let blog_state = BlogAppState::new(blog_repo, config.blog.clone(), generator);

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_state.clone()))
        .nest("/api/users", users_router(auth_state))
        .nest("/api/blogs", blog_router(blog_state.clone(), guard.clone()))
        .nest("/api/ai", ai_router(blog_state, guard))
        .nest("/api/health", health_router(db))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

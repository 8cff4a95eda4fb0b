use axum::http::{header, HeaderValue, Method};
use axum::middleware as axum_middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use folio_api::config::{self, Environment};
use folio_api::database::DatabaseManager;
use folio_api::handlers::{account, connect, health, portfolios, project_skills, projects, public, skills};
use folio_api::middleware::rate_limit::RatePolicies;
use folio_api::middleware::{
    jwt_auth_middleware, rate_limit_middleware, security_headers_middleware,
    suspicious_request_middleware, FixedWindowLimiter,
};

#[derive(Parser, Debug)]
#[command(name = "folio-api", about = "Portfolio management backend API")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (falls back to FOLIO_API_PORT, PORT, then 3000)
    #[arg(long)]
    port: Option<u16>,

    /// Apply pending database migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Folio API in {:?} mode", config.environment);

    if args.migrate {
        let pool = DatabaseManager::pool()
            .await
            .expect("database must be configured to migrate");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        tracing::info!("Database migrations applied");
    }

    let app = app();

    let port = args
        .port
        .or_else(|| std::env::var("FOLIO_API_PORT").ok().and_then(|s| s.parse().ok()))
        .or_else(|| std::env::var("PORT").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(3000);

    let bind_addr = format!("{}:{}", args.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Folio API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server");
}

fn app() -> Router {
    let global_limiter = Arc::new(FixedWindowLimiter::new(RatePolicies::global()));
    let api_limiter = Arc::new(FixedWindowLimiter::new(RatePolicies::api()));
    let auth_limiter = Arc::new(FixedWindowLimiter::new(RatePolicies::auth()));

    Router::new()
        .merge(public_routes())
        .merge(connect_routes(auth_limiter))
        .merge(api_routes(api_limiter))
        // Global middleware, innermost first: admission, response headers,
        // request inspection, CORS, tracing.
        .layer(axum_middleware::from_fn_with_state(
            global_limiter,
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(suspicious_request_middleware))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health/db", get(health::health_db))
        .route("/public/portfolios", get(public::list_portfolios))
        .route("/public/portfolios/:id", get(public::get_portfolio))
        .route("/public/portfolios/:id/projects", get(public::list_projects))
}

fn connect_routes(limiter: Arc<FixedWindowLimiter>) -> Router {
    Router::new()
        .route("/connect/authorize", post(connect::authorize))
        .route("/connect/token", post(connect::token))
        .route("/connect/userinfo", get(connect::userinfo))
        .route_layer(axum_middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

fn api_routes(limiter: Arc<FixedWindowLimiter>) -> Router {
    Router::new()
        .route(
            "/api/portfolios",
            get(portfolios::list_portfolios).post(portfolios::create_portfolio),
        )
        .route(
            "/api/portfolios/:id",
            get(portfolios::get_portfolio)
                .put(portfolios::update_portfolio)
                .delete(portfolios::delete_portfolio),
        )
        .route("/api/portfolios/:id/projects", get(projects::list_for_portfolio))
        .route("/api/projects", post(projects::create_project))
        .route(
            "/api/projects/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/:id/skills",
            get(project_skills::list_for_project).post(project_skills::add_skill),
        )
        .route(
            "/api/projects/:id/skills/:skill_id",
            put(project_skills::update_skill).delete(project_skills::remove_skill),
        )
        .route("/api/skills", get(skills::list_skills).post(skills::create_skill))
        .route(
            "/api/skills/:id",
            get(skills::get_skill)
                .put(skills::update_skill)
                .delete(skills::delete_skill),
        )
        .route("/api/auth/me", get(account::me))
        .route("/api/auth/sessions", get(account::list_sessions))
        .route("/api/auth/sessions/:id", delete(account::revoke_session))
        .route("/api/auth/consents", get(account::list_consents))
        .route("/api/auth/consents/:id", delete(account::revoke_consent))
        .route("/api/auth/activity", get(account::activity))
        .route("/api/auth/security-events", get(account::security_events))
        // Admission runs before authentication.
        .route_layer(axum_middleware::from_fn(jwt_auth_middleware))
        .route_layer(axum_middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

fn cors_layer() -> CorsLayer {
    let config = config::config();
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

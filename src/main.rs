use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use sgps_backend::{
    AppState,
    config::Config,
    middleware::{ADMIN_ONLY, auth_middleware, log_errors, require_role},
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'sgps_backend';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");

    let state = AppState::new(config, pool, Arc::new(redis_client));

    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::handler::register))
        .route("/auth/login", post(routes::auth::handler::login))
        .route("/auth/refresh", post(routes::auth::handler::refresh));

    // Admin endpoints get a second gate on top of token authentication.
    let admin_routes = Router::new()
        .route("/users", get(routes::user::handler::list_users))
        .route("/users/{id}/role", patch(routes::user::handler::update_role))
        .route(
            "/users/{id}/status",
            patch(routes::user::handler::update_status),
        )
        .layer(axum::middleware::from_fn_with_state(ADMIN_ONLY, require_role));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::handler::logout))
        // user routes
        .route(
            "/users/me",
            get(routes::user::handler::me)
                .put(routes::user::handler::update_me)
                .delete(routes::user::handler::deactivate_me),
        )
        .route("/users/{id}", get(routes::user::handler::get_user))
        .route(
            "/users/role/{role}",
            get(routes::user::handler::list_by_role),
        )
        .merge(admin_routes)
        // project routes
        .route(
            "/projects",
            get(routes::project::handler::list_projects)
                .post(routes::project::handler::create_project),
        )
        .route(
            "/projects/my-projects",
            get(routes::project::handler::my_projects),
        )
        .route(
            "/projects/{id}",
            get(routes::project::handler::get_project)
                .put(routes::project::handler::update_project)
                .delete(routes::project::handler::delete_project),
        )
        .route(
            "/projects/{id}/members",
            post(routes::project::handler::add_member),
        )
        .route(
            "/projects/{id}/members/{member_id}",
            delete(routes::project::handler::remove_member),
        )
        // task routes
        .route("/tasks", post(routes::task::handler::create_task))
        .route(
            "/tasks/assigned-to-me",
            get(routes::task::handler::assigned_to_me),
        )
        .route("/tasks/overdue", get(routes::task::handler::overdue_tasks))
        .route(
            "/tasks/{id}",
            get(routes::task::handler::get_task)
                .put(routes::task::handler::update_task)
                .delete(routes::task::handler::delete_task),
        )
        .route(
            "/tasks/project/{project_id}",
            get(routes::task::handler::list_by_project),
        )
        .route("/tasks/{id}/assign", post(routes::task::handler::assign_task))
        .route(
            "/tasks/{id}/comments",
            post(routes::task::handler::add_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .route("/health", get(routes::health::health))
        .nest(
            "/api",
            Router::new().merge(public_routes).merge(protected_routes),
        );

    let router = router.layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}

use business_portal::{
    AppState,
    auth::hash_password,
    config::{AppConfig, Env},
    create_router,
    models::{NewUser, Role},
    repository::{PostgresRepository, RepositoryState},
    session::create_session_layer,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired sessions are purged from the store.
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// main
///
/// Initializes configuration, logging, the database (schema + session table),
/// the optional bootstrap admin, and finally the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "business_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations");

    // 4. Sessions
    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .expect("FATAL: Failed to create the session table");
    tokio::spawn(purge_expired_sessions(session_store.clone()));
    let sessions = create_session_layer(session_store, &config);

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Bootstrap admin
    if let Some((email, password)) = config.bootstrap_admin() {
        ensure_admin(&repo, email, password).await;
    }

    // 6. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, config }, sessions);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind to BIND_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Create the configured admin account when no user owns that email yet.
async fn ensure_admin(repo: &RepositoryState, email: &str, password: &str) {
    let email = email.trim().to_lowercase();

    match repo.get_user_by_email(&email).await {
        Ok(Some(_)) => tracing::debug!(%email, "bootstrap admin already exists"),
        Ok(None) => {
            let password_hash =
                hash_password(password).expect("FATAL: Failed to hash ADMIN_PASSWORD");
            let admin = NewUser {
                email: email.clone(),
                first_name: Some("Admin".to_string()),
                last_name: None,
                phone: None,
                password_hash,
                role: Role::Admin,
            };
            match repo.create_user(admin).await {
                Ok(user) => tracing::info!(user_id = %user.id, %email, "bootstrap admin created"),
                Err(e) => tracing::error!(error = %e, "failed to create bootstrap admin"),
            }
        }
        Err(e) => tracing::error!(error = %e, "failed to look up bootstrap admin"),
    }
}

/// Periodically delete expired sessions.
async fn purge_expired_sessions(store: PostgresStore) {
    let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = store.delete_expired().await {
            tracing::warn!(error = %e, "failed to purge expired sessions");
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

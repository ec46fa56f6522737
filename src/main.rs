#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    auth::token_store::TokenStore,
    config::RuntimeConfiguration,
    routes::{
        import_export::{get_export_students, put_import_students},
        login::{post_login, post_logout, post_refresh},
        onboarding::post_add_new_admin,
        password::post_change_password,
        stats::{get_alerts, get_balance, get_health, get_stats},
        students::{
            delete_student, get_student, get_students, post_new_student, update_student,
        },
    },
    state::TalabaState,
};
use axum::{
    Router, ServiceExt,
    extract::{DefaultBodyLimit, Request},
    routing::{get, post, put},
};
use sqlx::postgres::PgPoolOptions;
use std::{env, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    normalize_path::NormalizePath,
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod analytics;
mod auth;
mod config;
mod data;
mod error;
mod routes;
mod seed;
mod state;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const TOKEN_PURGE_PERIOD: Duration = Duration::from_secs(15 * 60);

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

///the whole api; `/api/students/` and `/api/students` are the same route
fn app(state: TalabaState) -> NormalizePath<Router> {
    let trace_layer = TraceLayer::new_for_http();

    let router = Router::new()
        .route("/api/health", get(get_health))
        .route("/api/auth/login", post(post_login))
        .route("/api/auth/refresh", post(post_refresh))
        .route("/api/auth/logout", post(post_logout))
        .route("/api/auth/change-password", post(post_change_password))
        .route("/api/onboarding/admin", post(post_add_new_admin))
        .route("/api/students", get(get_students).post(post_new_student))
        .route("/api/students/stats", get(get_stats))
        .route("/api/students/alerts", get(get_alerts))
        .route("/api/students/export", get(get_export_students))
        .route("/api/students/import", put(put_import_students))
        .route(
            "/api/students/{id}",
            get(get_student)
                .put(update_student)
                .patch(update_student)
                .delete(delete_student),
        )
        .route("/api/students/{id}/balance", get(get_balance))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .with_state(state);

    //has to wrap the router, a router layer only runs after routing
    NormalizePath::trim_trailing_slash(router)
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("not loading .env file: {e}");
    }

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    let options = PgPoolOptions::new().max_connections(15);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = TalabaState::new(options, config)
        .await
        .expect("unable to create state");

    if env::args().nth(1).as_deref() == Some("seed-demo") {
        seed::seed_demo(&state)
            .await
            .expect("unable to seed demo data");
        return;
    }

    tokio::spawn(TokenStore::new(state.clone()).continuously_delete_expired(TOKEN_PURGE_PERIOD));

    let server_ip = env::var("TALABA_SERVER_IP").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("unable to serve app");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt as _;

    fn offline_app() -> NormalizePath<Router> {
        let state = TalabaState::lazy(RuntimeConfiguration::offline()).expect("lazy pool");
        app(state)
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("valid request");

        offline_app()
            .oneshot(request)
            .await
            .expect("infallible")
            .status()
    }

    #[tokio::test]
    async fn trailing_slashes_reach_the_same_route() {
        assert_eq!(
            status_of("GET", "/api/students/stats/").await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of("GET", "/api/students/stats").await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of("GET", "/api/students/").await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of("GET", "/api/students/STU-001/balance/").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn unknown_paths_are_still_missing() {
        assert_eq!(
            status_of("GET", "/api/nothing-here/").await,
            StatusCode::NOT_FOUND
        );
    }
}

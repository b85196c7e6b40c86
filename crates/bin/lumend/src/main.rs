//! # lumend — lumen daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`lumend.toml` + `LUMEN_*` env overrides)
//! - Initialize tracing
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct the transition engine and application services, injecting
//!   repositories via port traits
//! - Spawn the schedule evaluator tick
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lumen_adapter_http_axum::state::AppState;
use lumen_adapter_storage_sqlite_sqlx::{
    Config as DbConfig, SqliteAuditLogRepository, SqliteDeviceRepository,
    SqliteNotificationRepository, SqliteScheduleRepository,
};
use lumen_app::event_bus::InProcessEventBus;
use lumen_app::schedule_evaluator::ScheduleEvaluator;
use lumen_app::services::notification_service::NotificationService;
use lumen_app::services::registry_service::DeviceRegistry;
use lumen_app::services::schedule_service::ScheduleService;
use lumen_app::transition_engine::TransitionEngine;
use lumen_domain::id::UserId;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DbConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories, shared between the engine, the evaluator and the services
    let device_repo = Arc::new(SqliteDeviceRepository::new(pool.clone()));
    let audit_repo = Arc::new(SqliteAuditLogRepository::new(pool.clone()));
    let schedule_repo = Arc::new(SqliteScheduleRepository::new(pool.clone()));
    let notification_repo = Arc::new(SqliteNotificationRepository::new(pool));

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Recipient of system notifications (inconsistency alerts, schedule
    // outcomes). Minted per process; sessions address it via `x-user-id`.
    let operator = UserId::new();
    tracing::info!(%operator, "operator user id for this run");

    // Engine and services
    let engine = Arc::new(TransitionEngine::new(
        Arc::clone(&device_repo),
        Arc::clone(&audit_repo),
        Arc::clone(&notification_repo),
        Arc::clone(&event_bus),
        operator,
        config.storage_timeout(),
    ));
    let registry = Arc::new(DeviceRegistry::new(
        Arc::clone(&device_repo),
        Arc::clone(&event_bus),
    ));
    let schedules = Arc::new(ScheduleService::new(Arc::clone(&schedule_repo)));
    let notifications = Arc::new(NotificationService::new(Arc::clone(&notification_repo)));

    // Schedule evaluator tick
    let evaluator = Arc::new(ScheduleEvaluator::new(
        Arc::clone(&schedule_repo),
        Arc::clone(&engine),
        Arc::clone(&notification_repo),
        Arc::clone(&event_bus),
        operator,
    ));
    let tick = config.tick_interval();
    tokio::spawn(async move { evaluator.run(tick).await });

    // HTTP
    let state = AppState::new(
        registry,
        engine,
        schedules,
        notifications,
        audit_repo,
        event_bus,
    );
    let app = lumen_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "lumend listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
}

//! CallBill Server
//!
//! Receives call start/end records from the telephony platform, prices
//! completed calls against the time-of-day tariff, and serves monthly
//! subscriber bills.

use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use callbill_api::{configure_api, json_config, query_config, AppState};
use callbill_core::{models::TariffSchedule, AppConfig};
use callbill_db::MemoryStore;
use callbill_services::TariffPricer;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "callbill={},callbill_api={},callbill_db={},callbill_services={},actix_web=info,sqlx=warn",
            level, level, level, level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(startup_error)?;

    init_tracing(&config.log.level, config.log.json);

    info!("Starting CallBill v{}", env!("CARGO_PKG_VERSION"));

    let schedule = TariffSchedule::from_config(&config.tariff).map_err(startup_error)?;
    info!(
        standard_start = %schedule.standard_start(),
        standard_end = %schedule.standard_end(),
        "Tariff schedule loaded"
    );
    let pricer = TariffPricer::new(schedule);

    let state = match callbill_db::connect(&config.database)
        .await
        .map_err(startup_error)?
    {
        Some(pool) => {
            info!(
                "Database connection established with {} max connections",
                config.database.max_connections
            );
            AppState::with_pool(pool, pricer)
        }
        None => {
            warn!("No database URL configured, records are kept in memory only");
            AppState::with_memory_store(Arc::new(MemoryStore::new()), pricer)
        }
    };

    let bind_addr = config.server_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config())
            .app_data(query_config())
            // Middleware
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::NormalizePath::trim())
            .wrap(tracing_actix_web::TracingLogger::default())
            // Configure routes
            .configure(configure_api)
            // Root redirect to health
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(config.server.workers)
    .bind(&bind_addr)?
    .run()
    .await
}

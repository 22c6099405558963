mod config;
mod db;
mod job_controller;
mod report_engine;
mod services;

use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use crate::report_engine::emitter::HtmlConverter;
use crate::report_engine::ReportEngine;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    db::bootstrap(&config.db_path, config.seed_defaults).map_err(|e| {
        error!("Cannot prepare database {}: {}", config.db_path.display(), e);
        io::Error::other(e.to_string())
    })?;
    info!("Using database {}", config.db_path.display());

    let engine = ReportEngine::new(HtmlConverter::select(config.markdown_enabled));
    info!("HTML conversion: {:?}", engine.converter());

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState {
        jobs: Arc::new(RwLock::new(HashMap::new())),
        tx,
    };

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    let static_dir = config.static_dir.clone();
    if !static_dir.is_dir() {
        warn!("Static directory {} not found, serving the API only", static_dir.display());
    }

    let host = config.host.clone();
    let port = config.port;
    info!("Server running at http://{}:{}", host, port);

    let config = web::Data::new(config);
    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::JsonConfig::default().limit(config.json_limit))
            .app_data(config.clone())
            .app_data(web::Data::new(engine))
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::reports::configure_routes())
            .service(services::catalog::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::queries::configure_routes())
            .service(services::admin::configure_routes())
            .service(services::dataset::configure_routes());
        if static_dir.is_dir() {
            app.service(actix_files::Files::new("/", &static_dir).index_file("index.html"))
        } else {
            app
        }
    })
    .bind((host, port))?
    .run()
    .await
}

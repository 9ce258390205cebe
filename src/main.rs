use actix_web::{web, HttpServer};
use std::io;

use project_tracker::{build_app, config::Config, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let state = AppState::from_config(&config).await.map_err(|e| {
        log::error!("Failed to initialise application state: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    let state = web::Data::new(state);

    log::info!("Starting project tracker at {}", config.server_url());
    HttpServer::new(move || build_app(state.clone()))
        .bind((config.server_host.as_str(), config.server_port))?
        .run()
        .await
}

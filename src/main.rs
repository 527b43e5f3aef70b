use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

use wells_api::app_state::AppState;
use wells_api::cache::ResponseCache;
use wells_api::config::Config;
use wells_api::logging::{self, setup_logger};
use wells_api::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    setup_logger(&config.log_file, config.debug);

    let executor = db::connect(&config.data_source).map_err(|e| {
        log::error!("Failed to set up data source: {e}");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let state = AppState::new(executor, Arc::new(ResponseCache::default()));

    let bind_address = config.bind_address();
    log::info!("Data source: {}", config.data_source);
    log::info!("Starting server at http://{bind_address}");

    HttpServer::new(move || {
        App::new()
            .wrap(logging::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}

mod auth;
mod booking;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod slots;
mod state;
mod templates;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::{config::Config, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Config::from_env()?;
    db::ensure_sqlite_dir(&config.database_url)?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool, &config).await?;

    let address = format!("0.0.0.0:{}", config.port);
    log::info!(
        "Salon hours {}-{} every {} min, bookings in {}",
        config.working_hours.start.format("%H:%M"),
        config.working_hours.end.format("%H:%M"),
        config.working_hours.step_min,
        config.currency
    );
    log::info!("Starting salon booking on http://{address}");

    let state = AppState::new(pool, config);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::public::configure)
            .configure(routes::admin::configure)
            .configure(routes::stylist::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}

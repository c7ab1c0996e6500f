use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::info;

use crate::{
    app_data::AppData,
    assets,
    context::{sync_pokemon_indexes, Context},
    controller,
    utils::{config::Config, result::Result},
};

/// App data, routes, extractor settings and the static fallback, shared by the
/// server and the tests.
pub fn configure(data: web::Data<AppData>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        let files = assets::static_files(&data.static_roots);
        cfg.app_data(data)
            .app_data(controller::json_config())
            .configure(controller::route);
        if let Some(files) = files {
            cfg.default_service(files);
        }
    }
}

pub async fn run() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let context = Context::connect(&config).await?;
    let indexes = context.clone();
    actix_web::rt::spawn(async move { sync_pokemon_indexes(&indexes).await });

    let data = web::Data::new(AppData::new(context.clone(), &config)?);
    info!("Server is set up. Ready to start listening on a port.");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .configure(configure(data.clone()))
    })
    .bind(config.bind_name())?
    .run();
    info!("Server is running on {}", config.public_url());
    server.await?;

    context.shutdown().await;
    info!("MongoDB client closed");
    Ok(())
}

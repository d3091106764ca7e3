use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use log::{error, info};

use crate::{
    database::{mongo::MongoConnector, DatabaseClient},
    environment::{
        CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET, CLOUDINARY_NAME, HOST, MONGODB_URI, PORT,
        UPLOAD_DIR,
    },
    object_store::cloudinary::CloudinaryStore,
    routes::AppState,
    upload::UploadReceiver,
};

pub mod database;
pub mod document;
pub mod environment;
pub mod errors;
pub mod filesystem;
pub mod object_store;
pub mod routes;
pub mod upload;

#[cfg(test)]
mod testing;

// One runtime for everything: HttpServer needs the actix system, and the
// tests run on it too. async-std only supplies the file I/O, which runs on
// its own blocking pool regardless of the executor.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    info!("MongoDB REST proxy version {}", env!("CARGO_PKG_VERSION"));
    info!("Connecting to MongoDB...");
    let database = DatabaseClient::new(MongoConnector::new(MONGODB_URI.as_str()));
    if let Err(e) = database.connect().await {
        error!("Error connecting to database: {}", e);
        std::process::exit(1);
    }

    let state = web::Data::new(AppState {
        database,
        uploads: UploadReceiver::new(UPLOAD_DIR.as_str()),
        object_store: Arc::new(CloudinaryStore::new(
            CLOUDINARY_NAME.as_str(),
            CLOUDINARY_API_KEY.as_str(),
            CLOUDINARY_API_SECRET.as_str(),
        )),
    });

    info!("Starting server on {}:{}...", *HOST, *PORT);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .send_wildcard()
                    .allowed_methods(vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"])
                    .allowed_header(header::CONTENT_TYPE),
            )
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((HOST.as_str(), *PORT))?
    .run()
    .await
}

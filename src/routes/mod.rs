use std::sync::Arc;

use actix_web::web;

use crate::{database::DatabaseClient, object_store::ObjectStore, upload::UploadReceiver};

pub mod body;
pub mod read_all;
pub mod write_one;

/// Shared by every worker for the lifetime of the process.
pub struct AppState {
    pub database: DatabaseClient,
    pub uploads: UploadReceiver,
    pub object_store: Arc<dyn ObjectStore>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/{db_name}/{collect_name}",
        web::get().to(read_all::handle),
    )
    .route(
        "/api/{db_name}/{collect_name}",
        web::post().to(write_one::handle),
    );
}

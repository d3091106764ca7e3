use actix_web::{web, HttpRequest, Responder};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use super::{body, AppState};
use crate::{
    document,
    errors::{ApiError, Error, Result},
    object_store::REMOTE_FOLDER,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    message: &'static str,
    inserted_id: Value,
}

pub async fn handle(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> std::result::Result<impl Responder, ApiError> {
    let (db_name, collect_name) = path.into_inner();
    match save(&req, payload, &state, &db_name, &collect_name).await {
        Ok(inserted_id) => Ok(web::Json(SaveResponse {
            message: "Data saved successfully.",
            inserted_id,
        })),
        Err(Error::BadRequest(reason)) => {
            error!("Rejected write to {}.{}: {}", db_name, collect_name, reason);
            Err(ApiError::InvalidBody)
        }
        Err(e) => {
            error!("Error saving data to {}.{}: {}", db_name, collect_name, e);
            Err(ApiError::SaveFailed)
        }
    }
}

/// Local write, then remote upload, then insert, each only after the one
/// before it succeeded. Nothing is rolled back: a failed upload leaves the
/// local file behind, and a failed insert leaves the remote object behind.
async fn save(
    req: &HttpRequest,
    payload: web::Payload,
    state: &AppState,
    db_name: &str,
    collect_name: &str,
) -> Result<Value> {
    let body = body::read(req, payload, &state.uploads, collect_name).await?;
    let database = state.database.get_database(db_name).await?;
    let collection = database.collection(collect_name);

    let document = match body.image {
        Some(image) => {
            info!(
                "Mirroring {} from {} folder to object store",
                image.original_name,
                image.folder.dir_name()
            );
            let asset = state.object_store.upload(&image.path, REMOTE_FOLDER).await?;
            document::image_document(&asset.secure_url, &body.fields)?
        }
        None => document::from_fields(&body.fields)?,
    };

    let inserted_id = collection.insert_one(document).await?;
    info!("Inserted document into {}.{}", database.name(), collect_name);
    Ok(document::to_json_value(inserted_id))
}

use actix_web::{web, Responder};
use log::error;
use serde_json::Value;

use super::AppState;
use crate::{
    document,
    errors::{ApiError, Result},
};

pub async fn handle(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> std::result::Result<impl Responder, ApiError> {
    let (db_name, collect_name) = path.into_inner();
    match find_all(&state, &db_name, &collect_name).await {
        Ok(documents) => Ok(web::Json(documents)),
        Err(e) => {
            error!("Error retrieving data from {}.{}: {}", db_name, collect_name, e);
            Err(ApiError::RetrieveFailed)
        }
    }
}

async fn find_all(state: &AppState, db_name: &str, collect_name: &str) -> Result<Vec<Value>> {
    let database = state.database.get_database(db_name).await?;
    let documents = database.collection(collect_name).find_all().await?;
    Ok(documents.into_iter().map(document::to_json).collect())
}

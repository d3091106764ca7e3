use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Client,
};

use super::{Connection, Connector};
use crate::errors::{Error, Result};

pub struct MongoConnector {
    uri: String,
}

impl MongoConnector {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>> {
        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        // The driver connects lazily; ping so an unreachable server fails here.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Arc::new(MongoConnection { client }))
    }
}

pub struct MongoConnection {
    client: Client,
}

#[async_trait]
impl Connection for MongoConnection {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        let documents = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .await?
            .try_collect::<Vec<Document>>()
            .await?;
        Ok(documents)
    }

    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> Result<Bson> {
        let result = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .insert_one(document)
            .await?;
        Ok(result.inserted_id)
    }
}

pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use mongodb::bson::{Bson, Document};
use tokio::sync::OnceCell;

use crate::errors::{Error, Result};

/// Opens the single physical connection to the document store.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Connection>>;
}

/// An established connection. Any database or collection can be addressed
/// through it without reconnecting.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>>;

    async fn insert_one(&self, database: &str, collection: &str, document: Document)
        -> Result<Bson>;
}

/// Process-wide database client. The connection is opened at most once, the
/// first time anything asks for it; callers racing on that first request all
/// wait on the same attempt.
pub struct DatabaseClient {
    connector: Box<dyn Connector>,
    connection: OnceCell<Arc<dyn Connection>>,
}

impl DatabaseClient {
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            connection: OnceCell::new(),
        }
    }

    pub async fn connect(&self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<&Arc<dyn Connection>> {
        self.connection
            .get_or_try_init(|| async {
                let connection = self.connector.connect().await?;
                info!("Database connection successful");
                Ok::<_, Error>(connection)
            })
            .await
    }

    pub async fn get_database(&self, name: &str) -> Result<DatabaseHandle> {
        let connection = self.connection().await?;
        Ok(DatabaseHandle {
            connection: connection.clone(),
            name: name.to_string(),
        })
    }
}

pub struct DatabaseHandle {
    connection: Arc<dyn Connection>,
    name: String,
}

impl DatabaseHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self, name: &str) -> CollectionHandle {
        CollectionHandle {
            connection: self.connection.clone(),
            database: self.name.clone(),
            name: name.to_string(),
        }
    }
}

/// A collection addressed by name only. Nothing checks that it exists; the
/// store creates it on first insert and reads of a missing one come back empty.
pub struct CollectionHandle {
    connection: Arc<dyn Connection>,
    database: String,
    name: String,
}

impl CollectionHandle {
    pub async fn find_all(&self) -> Result<Vec<Document>> {
        self.connection.find_all(&self.database, &self.name).await
    }

    pub async fn insert_one(&self, document: Document) -> Result<Bson> {
        self.connection
            .insert_one(&self.database, &self.name, document)
            .await
    }
}

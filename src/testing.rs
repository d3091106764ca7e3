//! In-memory doubles for the database and object store.

use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use crate::{
    database::{Connection, Connector},
    errors::{Error, Result},
    object_store::{ObjectStore, StoredAsset},
};

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MemoryConnector {
    connection: Arc<MemoryConnection>,
    connects: Counter,
    reachable: bool,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MemoryConnection::default()),
            connects: Counter::default(),
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    pub fn connect_counter(&self) -> Counter {
        self.connects.clone()
    }

    pub fn connection(&self) -> Arc<MemoryConnection> {
        self.connection.clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>> {
        self.connects.bump();
        // Let racing callers pile up behind this attempt.
        tokio::task::yield_now().await;
        if !self.reachable {
            return Err(Error::Connection("connection refused".to_string()));
        }
        Ok(self.connection.clone())
    }
}

#[derive(Default)]
pub struct MemoryConnection {
    collections: Mutex<HashMap<(String, String), Vec<Document>>>,
    failing: AtomicBool,
}

impl MemoryConnection {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::DatabaseOperation("server selection timeout".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.check()?;
        Ok(self.documents(database, collection))
    }

    async fn insert_one(
        &self,
        database: &str,
        collection: &str,
        mut document: Document,
    ) -> Result<Bson> {
        self.check()?;
        if !document.contains_key("_id") {
            document.insert("_id", ObjectId::new());
        }
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        self.collections
            .lock()
            .unwrap()
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .push(document);
        Ok(id)
    }
}

pub struct MemoryObjectStore {
    uploads: Counter,
    failing: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            uploads: Counter::default(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn upload_counter(&self) -> Counter {
        self.uploads.clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<StoredAsset> {
        self.uploads.bump();
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Upload("service unavailable".to_string()));
        }
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(StoredAsset {
            secure_url: format!("https://cdn.test/{}/{}", folder, name),
        })
    }
}

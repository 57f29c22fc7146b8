use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::{Result, SchemeError};
use crate::schema::{SchemaBuilder, SchemeDocument};
use crate::store::SchemeStore;

/// Owns the in-memory scheme document and the single in-flight regeneration.
pub struct SchemeService {
    builder: SchemaBuilder,
    store: SchemeStore,
    document: RwLock<Option<Arc<SchemeDocument>>>,
    build_lock: Mutex<()>,
}

impl SchemeService {
    pub fn new(builder: SchemaBuilder, store: SchemeStore) -> Self {
        Self {
            builder,
            store,
            document: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SchemeStore {
        &self.store
    }

    /// Document currently being served, if any.
    pub async fn document(&self) -> Option<Arc<SchemeDocument>> {
        self.document.read().await.clone()
    }

    async fn install(&self, document: SchemeDocument) -> Arc<SchemeDocument> {
        let document = Arc::new(document);
        *self.document.write().await = Some(Arc::clone(&document));
        document
    }

    /// Rebuild the schema from the database, persist it and start serving it.
    ///
    /// Rejected with [`SchemeError::BuildInProgress`] while another build runs.
    /// On failure nothing is written and the served document is unchanged.
    pub async fn regenerate(&self) -> Result<Arc<SchemeDocument>> {
        let _guard = self
            .build_lock
            .try_lock()
            .map_err(|_| SchemeError::BuildInProgress)?;

        log::info!("Generating schema from database...");
        let document = self.builder.build().await?;
        self.store.save(&document)?;
        Ok(self.install(document).await)
    }

    /// Startup policy: use the persisted document, regenerating when there is
    /// none or when `refresh` is set.
    ///
    /// If regeneration fails but a persisted document exists, that document is
    /// served. Without one, the failure is returned.
    pub async fn load_or_regenerate(&self, refresh: bool) -> Result<Arc<SchemeDocument>> {
        let persisted = self.store.load()?;

        let persisted = match persisted {
            Some(document) if !refresh => return Ok(self.install(document).await),
            other => other,
        };

        if persisted.is_none() {
            log::info!("No usable {}; generating a new schema", self.store.path().display());
        }

        match self.regenerate().await {
            Ok(document) => Ok(document),
            Err(e) => match persisted {
                Some(document) => {
                    log::warn!(
                        "Schema regeneration failed ({}); serving {}",
                        e,
                        self.store.path().display()
                    );
                    Ok(self.install(document).await)
                }
                None => Err(e),
            },
        }
    }
}

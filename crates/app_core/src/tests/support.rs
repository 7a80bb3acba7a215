//! Repository doubles shared by the controller tests.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::{Gender, PetFields, PetId, PetRow, Projection, Selection};
use storage::{PetChange, PetStore};
use tokio::sync::{broadcast, Semaphore};

use crate::PetRepository;

pub(crate) async fn memory_store() -> Arc<PetStore> {
    Arc::new(PetStore::new("sqlite::memory:").await.expect("db"))
}

/// Every operation fails, like a store whose disk went away.
pub(crate) struct FailingRepository {
    changes: broadcast::Sender<PetChange>,
}

impl FailingRepository {
    pub(crate) fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(4);
        Arc::new(Self { changes })
    }
}

#[async_trait]
impl PetRepository for FailingRepository {
    async fn insert(&self, _fields: &PetFields) -> Result<PetId> {
        Err(anyhow!("disk I/O error"))
    }

    async fn update(&self, _id: PetId, _fields: &PetFields) -> Result<u64> {
        Err(anyhow!("disk I/O error"))
    }

    async fn delete(&self, _selection: Selection) -> Result<u64> {
        Err(anyhow!("disk I/O error"))
    }

    async fn query(&self, _selection: Selection, _projection: Projection) -> Result<Vec<PetRow>> {
        Err(anyhow!("disk I/O error"))
    }

    fn subscribe(&self) -> broadcast::Receiver<PetChange> {
        self.changes.subscribe()
    }
}

/// Wraps a real store but holds each query until the test releases it.
pub(crate) struct GatedRepository {
    inner: Arc<PetStore>,
    gate: Semaphore,
}

impl GatedRepository {
    pub(crate) fn new(inner: Arc<PetStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: Semaphore::new(0),
        })
    }

    pub(crate) fn release_one(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl PetRepository for GatedRepository {
    async fn insert(&self, fields: &PetFields) -> Result<PetId> {
        self.inner.insert(fields).await
    }

    async fn update(&self, id: PetId, fields: &PetFields) -> Result<u64> {
        self.inner.update(id, fields).await
    }

    async fn delete(&self, selection: Selection) -> Result<u64> {
        self.inner.delete(selection).await
    }

    async fn query(&self, selection: Selection, projection: Projection) -> Result<Vec<PetRow>> {
        let permit = self.gate.acquire().await?;
        permit.forget();
        self.inner.query(selection, projection).await
    }

    fn subscribe(&self) -> broadcast::Receiver<PetChange> {
        self.inner.subscribe()
    }
}

/// Answers every id lookup with two rows, which a unique key should make impossible.
pub(crate) struct DuplicateRowsRepository {
    changes: broadcast::Sender<PetChange>,
}

impl DuplicateRowsRepository {
    pub(crate) fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(4);
        Arc::new(Self { changes })
    }
}

#[async_trait]
impl PetRepository for DuplicateRowsRepository {
    async fn insert(&self, _fields: &PetFields) -> Result<PetId> {
        Ok(PetId(1))
    }

    async fn update(&self, _id: PetId, _fields: &PetFields) -> Result<u64> {
        Ok(2)
    }

    async fn delete(&self, _selection: Selection) -> Result<u64> {
        Ok(2)
    }

    async fn query(&self, selection: Selection, _projection: Projection) -> Result<Vec<PetRow>> {
        let id = match selection {
            Selection::Id(id) => id,
            Selection::All => PetId(1),
        };
        let row = |name: &str| PetRow {
            id,
            name: name.to_string(),
            breed: String::new(),
            gender: Some(Gender::Unknown),
            weight: Some(0),
        };
        Ok(vec![row("first"), row("second")])
    }

    fn subscribe(&self) -> broadcast::Receiver<PetChange> {
        self.changes.subscribe()
    }
}

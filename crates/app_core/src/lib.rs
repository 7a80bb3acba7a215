//! Controllers that sit between a pet catalog front end and the pet store.
//!
//! Front ends render what these types expose (list items, form fields,
//! notices, the dirty flag) and feed user actions back in.

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{PetFields, PetId, PetRow, Projection, Selection};
use storage::{PetChange, PetStore};
use tokio::sync::broadcast;

pub mod catalog;
pub mod editor;
pub mod notice;

pub use catalog::{CatalogController, CatalogView, EditorTarget, PetListItem};
pub use editor::{EditorController, ExitDecision, ExitKind, FieldEdit, PromptChoice, SaveOutcome};
pub use notice::Notice;

/// Data access used by the controllers. [`PetStore`] is the production implementation.
#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn insert(&self, fields: &PetFields) -> Result<PetId>;
    async fn update(&self, id: PetId, fields: &PetFields) -> Result<u64>;
    async fn delete(&self, selection: Selection) -> Result<u64>;
    async fn query(&self, selection: Selection, projection: Projection) -> Result<Vec<PetRow>>;
    fn subscribe(&self) -> broadcast::Receiver<PetChange>;
}

#[async_trait]
impl PetRepository for PetStore {
    async fn insert(&self, fields: &PetFields) -> Result<PetId> {
        PetStore::insert(self, fields).await
    }

    async fn update(&self, id: PetId, fields: &PetFields) -> Result<u64> {
        PetStore::update(self, id, fields).await
    }

    async fn delete(&self, selection: Selection) -> Result<u64> {
        PetStore::delete(self, selection).await
    }

    async fn query(&self, selection: Selection, projection: Projection) -> Result<Vec<PetRow>> {
        PetStore::query(self, selection, projection).await
    }

    fn subscribe(&self) -> broadcast::Receiver<PetChange> {
        PetStore::subscribe(self)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

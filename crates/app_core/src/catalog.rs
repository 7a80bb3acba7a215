//! Catalog list controller: keeps a list of pets in step with the store.
//!
//! Loads run as spawned tokio tasks and hand their rows back over a oneshot
//! channel. The controller only swaps its dataset when it polls or awaits a
//! finished load, so the bound list is always either the old rows or the new
//! ones. `start_load`/`activate` must be called from within a tokio runtime.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use shared::{
    domain::{display_breed, Gender, PetFields, PetId, PetRow, Projection, Selection},
    uri::PetUri,
};
use storage::PetChange;
use tokio::{
    sync::{
        broadcast::{self, error::TryRecvError as ChangeRecvError},
        oneshot::{self, error::TryRecvError as LoadRecvError},
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{notice::Notice, PetRepository};

/// Two-line list entry: the pet's name over its breed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetListItem {
    pub id: PetId,
    pub title: String,
    pub subtitle: String,
}

impl From<PetRow> for PetListItem {
    fn from(row: PetRow) -> Self {
        let subtitle = display_breed(&row.breed).to_string();
        Self {
            id: row.id,
            title: row.name,
            subtitle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogView<'a> {
    /// Nothing stored; show the empty-state view instead of the list.
    Placeholder,
    List(&'a [PetListItem]),
}

/// Where the editor should open when navigating from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTarget {
    Create,
    Edit(PetId),
}

impl EditorTarget {
    pub fn id(&self) -> Option<PetId> {
        match self {
            EditorTarget::Create => None,
            EditorTarget::Edit(id) => Some(*id),
        }
    }

    pub fn uri(&self) -> Option<PetUri> {
        self.id().map(PetUri::with_appended_id)
    }
}

/// The record inserted by the "insert dummy data" debug action.
pub fn dummy_pet() -> PetFields {
    PetFields::new("Toto", "Terrier", Gender::Male, 7)
}

type LoadResult = Result<Vec<PetRow>>;

struct PendingLoad {
    rx: oneshot::Receiver<LoadResult>,
    task: JoinHandle<()>,
}

pub struct CatalogController {
    repo: Arc<dyn PetRepository>,
    items: Vec<PetListItem>,
    pending: Option<PendingLoad>,
    changes: Option<broadcast::Receiver<PetChange>>,
}

impl CatalogController {
    pub fn new(repo: Arc<dyn PetRepository>) -> Self {
        Self {
            repo,
            items: Vec::new(),
            pending: None,
            changes: None,
        }
    }

    /// Starts watching the store for changes and kicks off the first load.
    pub fn activate(&mut self) {
        if self.changes.is_none() {
            self.changes = Some(self.repo.subscribe());
        }
        self.start_load();
    }

    /// Queries the whole table in the background, replacing any load in flight.
    pub fn start_load(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.task.abort();
        }

        let repo = Arc::clone(&self.repo);
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = repo.query(Selection::All, Projection::Summary).await;
            // The receiver is gone when the controller was torn down.
            let _ = tx.send(result);
        });
        debug!("started catalog load");
        self.pending = Some(PendingLoad { rx, task });
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Non-blocking tick: binds a finished load and reloads after store changes.
    ///
    /// Returns `true` when the dataset was replaced.
    pub fn poll(&mut self) -> bool {
        let mut replaced = false;

        if let Some(pending) = self.pending.as_mut() {
            match pending.rx.try_recv() {
                Ok(result) => {
                    self.pending = None;
                    match result {
                        Ok(rows) => {
                            self.bind(rows);
                            replaced = true;
                        }
                        Err(error) => warn!(%error, "catalog load failed; keeping previous rows"),
                    }
                }
                Err(LoadRecvError::Empty) => {}
                Err(LoadRecvError::Closed) => {
                    self.pending = None;
                    warn!("catalog load ended without a result");
                }
            }
        }

        if self.drain_changes() {
            self.start_load();
        }

        replaced
    }

    /// Waits for the load in flight, if any, and binds its rows.
    ///
    /// Returns `Ok(false)` when nothing was loading. A failed load leaves the
    /// current rows in place.
    pub async fn wait_loaded(&mut self) -> Result<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };

        let rows = pending
            .rx
            .await
            .map_err(|_| anyhow!("catalog load was cancelled"))??;
        self.bind(rows);
        Ok(true)
    }

    pub fn items(&self) -> &[PetListItem] {
        &self.items
    }

    pub fn view(&self) -> CatalogView<'_> {
        if self.items.is_empty() {
            CatalogView::Placeholder
        } else {
            CatalogView::List(&self.items)
        }
    }

    pub fn select(&self, id: PetId) -> EditorTarget {
        info!(uri = %PetUri::with_appended_id(id), "opening pet in editor");
        EditorTarget::Edit(id)
    }

    pub fn add(&self) -> EditorTarget {
        EditorTarget::Create
    }

    pub async fn insert_dummy_pet(&self) -> Notice {
        match self.repo.insert(&dummy_pet()).await {
            Ok(id) => Notice::PetSaved(PetUri::with_appended_id(id)),
            Err(error) => {
                warn!(%error, "failed to insert dummy pet");
                Notice::SaveFailed
            }
        }
    }

    pub async fn delete_all_pets(&self) -> Notice {
        match self.repo.delete(Selection::All).await {
            Ok(count) => Notice::PetsDeleted(count),
            Err(error) => {
                warn!(%error, "failed to delete all pets");
                Notice::DeleteAllFailed
            }
        }
    }

    /// Cancels any load in flight, stops watching the store and releases the rows.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            debug!("discarded in-flight catalog load");
        }
        self.changes = None;
        self.items.clear();
    }

    fn bind(&mut self, rows: Vec<PetRow>) {
        self.items = rows.into_iter().map(PetListItem::from).collect();
        debug!(count = self.items.len(), "bound catalog rows");
    }

    fn drain_changes(&mut self) -> bool {
        let Some(changes) = self.changes.as_mut() else {
            return false;
        };

        let mut changed = false;
        loop {
            match changes.try_recv() {
                Ok(_) | Err(ChangeRecvError::Lagged(_)) => changed = true,
                Err(ChangeRecvError::Empty) => break,
                Err(ChangeRecvError::Closed) => {
                    self.changes = None;
                    break;
                }
            }
        }
        changed
    }
}

impl Drop for CatalogController {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;

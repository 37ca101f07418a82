//! Inventory
//!
//! The list of discovered items the player drags onto the surface. Kept in
//! sync with the store by applying merge events.

use crate::catalog::Item;
use crate::error::StoreError;
use crate::playground::MergeEvent;
use crate::protocol::DropPayload;
use crate::store::RecipeStore;

pub struct Inventory {
    /// Whole catalog, ordered by id
    items: Vec<Item>,
    /// Discovered items, ordered by id
    unlocked: Vec<Item>,
}

impl Inventory {
    pub async fn load(store: &dyn RecipeStore) -> Result<Self, StoreError> {
        let items = store.items().await?;
        let unlocked = store.unlocked_items().await?;
        tracing::info!("Inventory: {} of {} items discovered", unlocked.len(), items.len());
        Ok(Self { items, unlocked })
    }

    /// Re-read both lists, e.g. after missing merge events
    pub async fn reload(&mut self, store: &dyn RecipeStore) -> Result<(), StoreError> {
        *self = Self::load(store).await?;
        Ok(())
    }

    pub fn all(&self) -> &[Item] {
        &self.items
    }

    pub fn unlocked(&self) -> &[Item] {
        &self.unlocked
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|i| i.id == id)
    }

    /// Record the merge result. Returns true if the item is new to the list.
    pub fn apply_merge(&mut self, event: &MergeEvent) -> bool {
        if self.is_unlocked(&event.result.id) {
            return false;
        }

        let mut item = event.result.clone();
        item.unlocked = true;
        if let Some(known) = self.items.iter_mut().find(|i| i.id == item.id) {
            known.unlocked = true;
        }
        let at = self
            .unlocked
            .partition_point(|i| i.id.as_str() < item.id.as_str());
        self.unlocked.insert(at, item);
        true
    }

    /// (discovered, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.unlocked.len(), self.items.len())
    }

    /// Drag payload for an inventory entry. Locked items can't be dragged.
    pub fn drag_payload(&self, id: &str) -> Option<DropPayload> {
        self.unlocked
            .iter()
            .find(|i| i.id == id)
            .map(|i| DropPayload::for_inventory(i.clone()))
    }
}

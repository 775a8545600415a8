use std::sync::RwLock;

use crate::{CatalogError, CatalogStore, CustomizationId, Item, ItemId, NewItem};

/// In-memory catalog store. Data is lost on restart.
///
/// Items are kept in a `Vec` so `list` returns insertion order. Readers
/// share the lock; writers take it exclusively.
pub struct InMemoryCatalogStore {
    inner: RwLock<Inner>,
}

struct Inner {
    items: Vec<Item>,
    next_customization_id: CustomizationId,
}

impl Inner {
    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    fn assign(&mut self, item: NewItem) -> Item {
        let next = &mut self.next_customization_id;
        item.into_item(|| {
            let id = *next;
            *next += 1;
            id
        })
    }
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: Vec::new(),
                next_customization_id: 1,
            }),
        }
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> CatalogError {
    CatalogError::StorageUnavailable("lock poisoned".into())
}

impl CatalogStore for InMemoryCatalogStore {
    fn list(&self) -> Result<Vec<Item>, CatalogError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.items.clone())
    }

    fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.items.iter().find(|i| &i.id == id).cloned())
    }

    fn create(&self, item: NewItem) -> Result<Item, CatalogError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.position(&item.id).is_some() {
            return Err(CatalogError::AlreadyExists);
        }
        let item = inner.assign(item);
        inner.items.push(item.clone());
        Ok(item)
    }

    fn update(&self, item: NewItem) -> Result<Item, CatalogError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let Some(pos) = inner.position(&item.id) else {
            return Err(CatalogError::NotFound);
        };
        // Old customizations are owned by the replaced value and dropped with it.
        let item = inner.assign(item);
        inner.items[pos] = item.clone();
        Ok(item)
    }

    fn delete(&self, id: &ItemId) -> Result<(), CatalogError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        match inner.position(id) {
            Some(pos) => {
                inner.items.remove(pos);
                Ok(())
            }
            None => Err(CatalogError::NotFound),
        }
    }
}

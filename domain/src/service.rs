use crate::validate::validate_new_item;
use crate::{CatalogError, CatalogStore, Item, ItemId, NewItem};

/// Application service in front of a catalog store.
///
/// Validates writes before they reach the store; reads pass straight
/// through. The store is supplied by the caller, so tests can swap in the
/// in-memory adapter or a failing double.
pub struct CatalogService<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All items in insertion order, fully populated.
    pub fn list(&self) -> Result<Vec<Item>, CatalogError> {
        self.store.list()
    }

    pub fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError> {
        self.store.get(id)
    }

    /// Create a new item. Fails with `AlreadyExists` if the id is taken.
    pub fn create(&self, input: NewItem) -> Result<Item, CatalogError> {
        validate_new_item(&input)?;
        self.store.create(input)
    }

    /// Replace an existing item, cascading its old customizations away.
    pub fn update(&self, input: NewItem) -> Result<Item, CatalogError> {
        validate_new_item(&input)?;
        self.store.update(input)
    }

    /// Delete an item together with its customizations.
    pub fn delete(&self, id: &ItemId) -> Result<(), CatalogError> {
        self.store.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::InMemoryCatalogStore;
    use crate::{CustomizationOption, ItemType, NewCustomization, SizeOption};
    use rust_decimal::Decimal;

    fn espresso() -> NewItem {
        NewItem {
            id: ItemId::new("i1").unwrap(),
            code: "ESP".into(),
            name: "Espresso".into(),
            category: "Coffee".into(),
            base_price: Decimal::new(250, 2),
            item_type: ItemType::Drink,
            sizes: vec![
                SizeOption {
                    name: "Small".into(),
                    price_modifier: Decimal::new(0, 1),
                },
                SizeOption {
                    name: "Large".into(),
                    price_modifier: Decimal::new(75, 2),
                },
            ],
            customizations: vec![NewCustomization {
                name: "Milk".into(),
                options: vec![CustomizationOption {
                    name: "Oat".into(),
                    price: Decimal::new(50, 2),
                }],
            }],
        }
    }

    #[test]
    fn create_then_list_returns_item() {
        let svc = CatalogService::new(InMemoryCatalogStore::new());
        let created = svc.create(espresso()).expect("created");
        let items = svc.list().unwrap();
        assert_eq!(items, vec![created]);
        assert_eq!(items[0].sizes.len(), 2);
        assert_eq!(items[0].customizations[0].options[0].name, "Oat");
    }

    #[test]
    fn list_on_empty_store_is_empty() {
        let svc = CatalogService::new(InMemoryCatalogStore::new());
        assert!(svc.list().unwrap().is_empty());
    }

    #[test]
    fn create_rejects_invalid_before_store() {
        let svc = CatalogService::new(InMemoryCatalogStore::new());
        let mut bad = espresso();
        bad.base_price = Decimal::new(-1, 0);
        let err = svc.create(bad).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert!(svc.list().unwrap().is_empty());
    }

    #[test]
    fn update_and_delete_flow() {
        let svc = CatalogService::new(InMemoryCatalogStore::new());
        svc.create(espresso()).unwrap();

        let mut changed = espresso();
        changed.name = "Double Espresso".into();
        let updated = svc.update(changed).unwrap();
        assert_eq!(updated.name, "Double Espresso");

        let id = ItemId::new("i1").unwrap();
        svc.delete(&id).unwrap();
        assert_eq!(svc.get(&id).unwrap(), None);
        assert!(matches!(svc.delete(&id), Err(CatalogError::NotFound)));
    }
}

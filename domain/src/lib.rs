//! Domain library for the point-of-sale item catalog.
//!
//! Holds the catalog types, the store port, and error definitions. Keep
//! adapters that need IO (SQLite, HTTP) out of this crate.

use rust_decimal::Decimal;

/// Unique, immutable identifier of a catalog item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CatalogError> {
        let val = s.into();
        if val.trim().is_empty() {
            return Err(CatalogError::Invalid("item id must not be empty".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of thing an item is. Closed set; unknown values are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Drink,
    Food,
    Merchandise,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Drink => "DRINK",
            ItemType::Food => "FOOD",
            ItemType::Merchandise => "MERCHANDISE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRINK" => Some(ItemType::Drink),
            "FOOD" => Some(ItemType::Food),
            "MERCHANDISE" => Some(ItemType::Merchandise),
            _ => None,
        }
    }
}

/// A named price adjustment for a size choice. Embedded in its item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeOption {
    pub name: String,
    /// Added to the base price when selected; may be negative.
    pub price_modifier: Decimal,
}

/// A single selectable add-on. Embedded in its customization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomizationOption {
    pub name: String,
    pub price: Decimal,
}

/// Generated identifier of a stored customization.
pub type CustomizationId = u64;

/// A named group of add-ons owned by exactly one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customization {
    pub id: CustomizationId,
    pub name: String,
    pub options: Vec<CustomizationOption>,
}

/// A customization as supplied by a caller, before the store assigns an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomization {
    pub name: String,
    pub options: Vec<CustomizationOption>,
}

/// A sellable catalog entry as stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub base_price: Decimal,
    pub item_type: ItemType,
    pub sizes: Vec<SizeOption>,
    pub customizations: Vec<Customization>,
}

/// Input data for creating or replacing an item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub category: String,
    pub base_price: Decimal,
    pub item_type: ItemType,
    pub sizes: Vec<SizeOption>,
    pub customizations: Vec<NewCustomization>,
}

impl NewItem {
    /// Attach store-assigned customization ids, in order.
    ///
    /// `ids` must yield at least one id per customization.
    pub fn into_item(self, mut ids: impl FnMut() -> CustomizationId) -> Item {
        let customizations = self
            .customizations
            .into_iter()
            .map(|c| Customization {
                id: ids(),
                name: c.name,
                options: c.options,
            })
            .collect();
        Item {
            id: self.id,
            code: self.code,
            name: self.name,
            category: self.category,
            base_price: self.base_price,
            item_type: self.item_type,
            sizes: self.sizes,
            customizations,
        }
    }
}

/// Store port for catalog items.
///
/// `list` returns items in insertion order; `update` keeps an item's
/// position. Deleting or updating an item deletes its previous
/// customizations together with the item row(s).
pub trait CatalogStore: Send + Sync {
    fn list(&self) -> Result<Vec<Item>, CatalogError>;
    fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError>;
    fn create(&self, item: NewItem) -> Result<Item, CatalogError>;
    /// Replace an existing item; customizations receive fresh ids.
    fn update(&self, item: NewItem) -> Result<Item, CatalogError>;
    fn delete(&self, id: &ItemId) -> Result<(), CatalogError>;
}

impl<T: CatalogStore + ?Sized> CatalogStore for std::sync::Arc<T> {
    fn list(&self) -> Result<Vec<Item>, CatalogError> {
        (**self).list()
    }

    fn get(&self, id: &ItemId) -> Result<Option<Item>, CatalogError> {
        (**self).get(id)
    }

    fn create(&self, item: NewItem) -> Result<Item, CatalogError> {
        (**self).create(item)
    }

    fn update(&self, item: NewItem) -> Result<Item, CatalogError> {
        (**self).update(item)
    }

    fn delete(&self, id: &ItemId) -> Result<(), CatalogError> {
        (**self).delete(id)
    }
}

/// Catalog errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The persistence layer could not be reached or a query failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("invalid item: {0}")]
    Invalid(String),
    #[error("item already exists")]
    AlreadyExists,
    #[error("item not found")]
    NotFound,
}

pub mod adapters;
pub mod service;
pub mod validate;

pub use service::CatalogService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_accepts_simple_values() {
        let id = ItemId::new("i1").expect("valid id");
        assert_eq!(id.as_str(), "i1");
    }

    #[test]
    fn item_id_rejects_blank() {
        assert!(matches!(ItemId::new(""), Err(CatalogError::Invalid(_))));
        assert!(matches!(ItemId::new("   "), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn item_type_parse_is_closed() {
        assert_eq!(ItemType::parse("DRINK"), Some(ItemType::Drink));
        assert_eq!(ItemType::parse("FOOD"), Some(ItemType::Food));
        assert_eq!(ItemType::parse("MERCHANDISE"), Some(ItemType::Merchandise));
        assert_eq!(ItemType::parse("drink"), None);
        assert_eq!(ItemType::parse("SERVICE"), None);
        for t in [ItemType::Drink, ItemType::Food, ItemType::Merchandise] {
            assert_eq!(ItemType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn into_item_assigns_ids_in_order() {
        let new = NewItem {
            id: ItemId::new("i1").unwrap(),
            code: "ESP".into(),
            name: "Espresso".into(),
            category: "Coffee".into(),
            base_price: Decimal::new(250, 2),
            item_type: ItemType::Drink,
            sizes: vec![],
            customizations: vec![
                NewCustomization { name: "Milk".into(), options: vec![] },
                NewCustomization { name: "Syrup".into(), options: vec![] },
            ],
        };
        let mut next = 10;
        let item = new.into_item(|| {
            next += 1;
            next
        });
        let ids: Vec<_> = item.customizations.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11, 12]);
    }
}

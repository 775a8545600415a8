//! JSON wire types for the catalog API.
//!
//! Field names are camelCase and decimals travel as JSON numbers. Input
//! customizations carry no id; one sent by a client (e.g. echoing a GET
//! response back in a PUT) is ignored.

use domain::{
    CatalogError, Customization, CustomizationOption, Item, ItemId, ItemType, NewCustomization,
    NewItem, SizeOption,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemTypeDto {
    Drink,
    Food,
    Merchandise,
}

impl From<ItemType> for ItemTypeDto {
    fn from(t: ItemType) -> Self {
        match t {
            ItemType::Drink => Self::Drink,
            ItemType::Food => Self::Food,
            ItemType::Merchandise => Self::Merchandise,
        }
    }
}

impl From<ItemTypeDto> for ItemType {
    fn from(t: ItemTypeDto) -> Self {
        match t {
            ItemTypeDto::Drink => Self::Drink,
            ItemTypeDto::Food => Self::Food,
            ItemTypeDto::Merchandise => Self::Merchandise,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOptionDto {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_modifier: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionDto {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CustomizationOut {
    pub id: u64,
    pub name: String,
    pub options: Vec<OptionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOut {
    pub id: String,
    pub code: String,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(rename = "type")]
    pub item_type: ItemTypeDto,
    pub sizes: Vec<SizeOptionDto>,
    pub customizations: Vec<CustomizationOut>,
}

#[derive(Debug, Deserialize)]
pub struct CustomizationIn {
    pub name: String,
    #[serde(default)]
    pub options: Vec<OptionDto>,
}

/// Body of `POST /api/items`, `PUT /api/items/:id`, and each seed entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemIn {
    pub id: String,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    #[serde(rename = "type")]
    pub item_type: ItemTypeDto,
    #[serde(default)]
    pub sizes: Vec<SizeOptionDto>,
    #[serde(default)]
    pub customizations: Vec<CustomizationIn>,
}

impl ItemIn {
    pub fn into_new_item(self) -> Result<NewItem, CatalogError> {
        Ok(NewItem {
            id: ItemId::new(self.id)?,
            code: self.code,
            name: self.name,
            category: self.category,
            base_price: self.base_price,
            item_type: self.item_type.into(),
            sizes: self.sizes.into_iter().map(SizeOption::from).collect(),
            customizations: self
                .customizations
                .into_iter()
                .map(|c| NewCustomization {
                    name: c.name,
                    options: c.options.into_iter().map(CustomizationOption::from).collect(),
                })
                .collect(),
        })
    }
}

impl From<SizeOptionDto> for SizeOption {
    fn from(s: SizeOptionDto) -> Self {
        Self {
            name: s.name,
            price_modifier: s.price_modifier,
        }
    }
}

impl From<SizeOption> for SizeOptionDto {
    fn from(s: SizeOption) -> Self {
        Self {
            name: s.name,
            price_modifier: s.price_modifier,
        }
    }
}

impl From<OptionDto> for CustomizationOption {
    fn from(o: OptionDto) -> Self {
        Self {
            name: o.name,
            price: o.price,
        }
    }
}

impl From<CustomizationOption> for OptionDto {
    fn from(o: CustomizationOption) -> Self {
        Self {
            name: o.name,
            price: o.price,
        }
    }
}

impl From<Customization> for CustomizationOut {
    fn from(c: Customization) -> Self {
        Self {
            id: c.id,
            name: c.name,
            options: c.options.into_iter().map(OptionDto::from).collect(),
        }
    }
}

impl From<Item> for ItemOut {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.as_str().to_string(),
            code: item.code,
            name: item.name,
            category: item.category,
            base_price: item.base_price,
            item_type: item.item_type.into(),
            sizes: item.sizes.into_iter().map(SizeOptionDto::from).collect(),
            customizations: item
                .customizations
                .into_iter()
                .map(CustomizationOut::from)
                .collect(),
        }
    }
}

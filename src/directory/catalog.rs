use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DirectoryEntry, FieldErrors};
use crate::{
    ledger::{ItemKind, LineItem},
    storage::StorageKey,
};

/// Product or service offered by a business unit. Prices are USD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub business_unit: String,
    pub price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CatalogItem {
    pub fn new(
        name: impl Into<String>,
        kind: ItemKind,
        business_unit: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            business_unit: business_unit.into(),
            price,
            active: true,
        }
    }

    /// Builds a comanda line from this item at its current price.
    pub fn to_line_item(&self, quantity: u32, discount_pct: f64) -> LineItem {
        let mut item = LineItem::new(self.kind, self.name.clone(), quantity, self.price, discount_pct);
        item.item_id = Some(self.id);
        item
    }
}

impl DirectoryEntry for CatalogItem {
    const STORAGE_KEY: StorageKey = StorageKey::Catalog;
    const LABEL: &'static str = "catalog item";

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "El nombre");
        errors.require("business_unit", &self.business_unit, "La unidad de negocio");
        if !self.price.is_finite() || self.price < 0.0 {
            errors.add("price", "El precio debe ser mayor o igual a cero");
        }
        errors
    }

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.business_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_carries_catalog_reference() {
        let item = CatalogItem::new("Corte", ItemKind::Service, "peluqueria", 30.0);
        let line = item.to_line_item(2, 10.0);
        assert_eq!(line.item_id, Some(item.id));
        assert_eq!(line.discount_amount, 6.0);
        assert_eq!(line.subtotal, 54.0);
    }

    #[test]
    fn negative_price_is_invalid() {
        let item = CatalogItem::new("Shampoo", ItemKind::Product, "tienda", -1.0);
        assert_eq!(
            item.validate().get("price"),
            Some("El precio debe ser mayor o igual a cero")
        );
    }
}

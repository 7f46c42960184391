//! The inventory record stored in the table
//!
//! One row per (store, item) pair. Field names are capitalized on the wire
//! because that is how the table attributes, the CSV header, and the API
//! responses all spell them.

use serde::{Deserialize, Serialize};

/// Table attribute holding the store name (partition key)
pub const ATTR_STORE: &str = "Store";

/// Table attribute holding the item name (sort key)
pub const ATTR_ITEM: &str = "Item";

/// Table attribute holding the stock count
pub const ATTR_COUNT: &str = "Count";

/// A single stock level for one item in one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryItem {
    pub store: String,
    pub item: String,
    pub count: i64,
}

impl InventoryItem {
    pub fn new(store: impl Into<String>, item: impl Into<String>, count: i64) -> Self {
        Self {
            store: store.into(),
            item: item.into(),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_capitalized_field_names() {
        let item = InventoryItem::new("Berlin", "Laptop", 12);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["Store"], "Berlin");
        assert_eq!(json["Item"], "Laptop");
        assert_eq!(json["Count"], 12);
    }

    #[test]
    fn deserializes_from_wire_shape() {
        let item: InventoryItem =
            serde_json::from_str(r#"{"Store":"Madrid","Item":"Mouse","Count":3}"#).unwrap();
        assert_eq!(item, InventoryItem::new("Madrid", "Mouse", 3));
    }
}
